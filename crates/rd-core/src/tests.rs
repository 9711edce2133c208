//! Unit tests for rd-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EngineRouteId, NodeId, RouteHandle};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(RouteHandle(1) < RouteHandle(2));
        assert!(EngineRouteId(100) > EngineRouteId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(RouteHandle::INVALID.0, u64::MAX);
        assert_eq!(EngineRouteId::INVALID.0, u32::MAX);
        assert!(!NodeId::default().is_valid());
        assert!(NodeId(0).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(RouteHandle(7).to_string(), "RouteHandle(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::{Position, Rect};

    #[test]
    fn zero_distance() {
        let p = Position::new(3.0, 1.0, -4.0);
        assert!(p.distance(p) < 1e-6);
    }

    #[test]
    fn ground_distance_ignores_height() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 50.0, 4.0);
        assert!((a.distance_2d(b) - 5.0).abs() < 1e-6);
        assert!(a.distance(b) > 50.0);
    }

    #[test]
    fn rect_from_unordered_corners() {
        let r = Rect::from_corners(Position::ground(10.0, 2.0), Position::ground(-1.0, 8.0));
        assert_eq!(r.min_x, -1.0);
        assert_eq!(r.max_z, 8.0);
        assert!(r.contains(Position::ground(0.0, 5.0)));
        assert!(r.contains(Position::ground(10.0, 8.0))); // border is inside
        assert!(!r.contains(Position::ground(11.0, 5.0)));
    }

    #[test]
    fn rect_expanded() {
        let r = Rect::from_corners(Position::ZERO, Position::ground(1.0, 1.0)).expanded(0.5);
        assert!(r.contains(Position::ground(-0.5, 1.5)));
    }
}

#[cfg(test)]
mod mover {
    use crate::MoverKind;

    #[test]
    fn terrain_access() {
        assert!(MoverKind::Ground.can_enter_land());
        assert!(!MoverKind::Ground.can_enter_water());
        assert!(MoverKind::Ship.can_enter_water());
        assert!(!MoverKind::Ship.can_enter_land());
        assert!(MoverKind::Hover.can_enter_land() && MoverKind::Hover.can_enter_water());
    }

    #[test]
    fn labels() {
        assert_eq!(MoverKind::Hover.to_string(), "hover");
        assert_eq!(MoverKind::default(), MoverKind::Ground);
    }
}

#[cfg(test)]
mod time {
    use crate::Tick;

    #[test]
    fn next_and_display() {
        assert_eq!(Tick::ZERO.next(), Tick(1));
        assert_eq!(Tick(5).offset(3), Tick(8));
        assert_eq!(Tick(12).to_string(), "T12");
    }
}
