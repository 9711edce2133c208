//! Unit tests for the convoy command line.

#[cfg(test)]
mod args {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::Args;

    #[test]
    fn no_arguments() {
        let args = Args::try_parse_from(["convoy"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn config_path_and_verbose() {
        let args = Args::try_parse_from(["convoy", "other.toml", "-v"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("other.toml")));
        assert!(args.verbose);

        let args = Args::try_parse_from(["convoy", "--verbose"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Args::try_parse_from(["convoy", "--verbsoe"]).is_err());
        assert!(Args::try_parse_from(["convoy", "a.toml", "b.toml"]).is_err());
    }
}
