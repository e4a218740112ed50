use crate::fixtures::{group, rdg, server, SERVERS_RDG};
use rdgmerge::{
    source::{load_source, parse_source, Group, Host},
    ImportError,
};
use std::fs;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_source_from_file() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let path = temp_dir.path().join("servers.rdg");
        fs::write(&path, SERVERS_RDG).unwrap();

        let tree = load_source(&path).unwrap();

        assert_eq!(tree.root_name, "Servers");
        assert_eq!(
            tree.root_group,
            Group::with_groups(
                "Servers",
                vec![Group::with_hosts(
                    "DCs",
                    vec![
                        Host::new("dc1.local"),
                        Host::new("dc2.local").with_display_name("DC2 Prod")
                    ]
                )]
            )
        );
    }

    #[test]
    fn test_load_source_missing_file() {
        let err = load_source("/nonexistent/servers.rdg").unwrap_err();

        assert!(matches!(err, ImportError::Read { .. }));
        assert!(err.is_per_file());
        assert!(err.to_string().contains("/nonexistent/servers.rdg"));
    }

    #[test]
    fn test_load_source_reports_path_on_invalid_format() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let path = temp_dir.path().join("view.rdg");
        fs::write(&path, "<CustomView/>").unwrap();

        let err = load_source(&path).unwrap_err();

        assert!(matches!(err, ImportError::InvalidFormat { .. }));
        assert!(err.to_string().contains("view.rdg"));
    }

    #[test]
    fn test_nested_groups_keep_document_order() {
        let body = format!(
            "{}{}",
            group("Zulu", &group("Inner", &server("z1"))),
            group("Alpha", &format!("{}{}", server("a2"), server("a1")))
        );

        let tree = parse_source(&rdg("Estate", &body)).unwrap();

        assert_eq!(
            tree.root_group,
            Group::with_groups(
                "Estate",
                vec![
                    Group::with_groups("Zulu", vec![Group::with_hosts("Inner", vec![Host::new("z1")])]),
                    Group::with_hosts("Alpha", vec![Host::new("a2"), Host::new("a1")]),
                ]
            )
        );
    }

    #[test]
    fn test_names_are_trimmed_and_unescaped() {
        let tree = parse_source(&rdg(" R&amp;D ", &server("lab &lt;1&gt;"))).unwrap();

        assert_eq!(tree.root_name, "R&D");
        assert_eq!(tree.root_group, Group::with_hosts("R&D", vec![Host::new("lab <1>")]));
    }

    #[test]
    fn test_empty_file_group_is_valid() {
        let tree = parse_source(&rdg("Empty", "")).unwrap();

        assert_eq!(tree.root_group.counts(), (0, 0));
    }
}
