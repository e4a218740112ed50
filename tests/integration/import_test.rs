use crate::fixtures::{
    crlf_existing_view, group, rdg, server, TestFixture, DESTINATION_FILE, EXISTING_VIEW, SERVERS_RDG,
};
use rdgmerge::{
    destination::CustomView,
    import::{run_import, ImportOptions},
    logging::{LogEvent, LogLevel},
    merge::NameMatching,
    selection::PathSelection,
    ImportError,
};
use std::fs;
use std::path::PathBuf;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options() -> ImportOptions {
        ImportOptions { destination_file: DESTINATION_FILE.to_string(), ..ImportOptions::default() }
    }

    fn import(
        fixture: &TestFixture,
        sources: Vec<PathBuf>,
        options: &ImportOptions,
    ) -> (Result<rdgmerge::ImportSummary, ImportError>, Vec<LogEvent>) {
        let mut selection = PathSelection::new(sources, fixture.views.clone());
        let mut events: Vec<LogEvent> = Vec::new();
        let result = run_import(&mut selection, options, &mut events);
        (result, events)
    }

    fn warnings(events: &[LogEvent]) -> Vec<&str> {
        events
            .iter()
            .filter(|e| e.level == LogLevel::Warning)
            .map(|e| e.message.as_str())
            .collect()
    }

    fn assert_footer(events: &[LogEvent]) {
        let last = events.last().expect("a run always logs");
        assert_eq!(last.level, LogLevel::Info);
        assert_eq!(last.message, "Import finished");
    }

    #[test]
    fn test_import_into_new_destination() {
        let fixture = TestFixture::new().unwrap();
        let source = fixture.with_source("servers.rdg", SERVERS_RDG).unwrap();

        let (result, events) = import(&fixture, vec![source], &options());
        let summary = result.unwrap();

        assert_eq!(summary.imported, vec!["Servers".to_string()]);
        assert_eq!(summary.destination, fixture.destination());
        assert!(summary.backup.is_none());
        assert!(fixture.backups().is_empty());
        assert_eq!(
            fixture.read_destination(),
            r#"<?xml version="1.0" encoding="utf-8"?>
<CustomView>
  <item name="Root" text="Root" imageindex="1">
    <item name="Servers" text="Servers" imageindex="0">
      <item name="DCs" text="DCs" imageindex="0">
        <item name="dc1.local" text="dc1.local" imageindex="2"/>
        <item name="dc2.local" text="DC2 Prod" imageindex="2"/>
      </item>
    </item>
  </item>
</CustomView>
"#
        );
        assert!(warnings(&events).is_empty());
        assert_footer(&events);
    }

    #[test]
    fn test_colliding_source_is_skipped_and_existing_subtree_kept() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_destination(EXISTING_VIEW).unwrap();
        let servers = fixture.with_source("servers.rdg", SERVERS_RDG).unwrap();
        let edge = fixture.with_source("edge.rdg", &rdg("Edge", &server("fw1"))).unwrap();

        let (result, events) = import(&fixture, vec![servers, edge], &options());
        let summary = result.unwrap();

        assert_eq!(summary.imported, vec!["Edge".to_string()]);
        assert_eq!(summary.collisions, vec!["Servers".to_string()]);
        let warnings = warnings(&events);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'Servers'"));

        let after = fixture.read_destination();
        assert!(after.contains(
            r#"    <item name="Servers" text="Servers" imageindex="0">
      <item name="old.local" text="Old box" imageindex="2"/>
    </item>
"#
        ));
        let view = CustomView::parse(&after, "after").unwrap();
        assert_eq!(view.top_level_names(), vec!["Servers", "Lab", "Edge"]);
    }

    #[test]
    fn test_existing_items_keep_their_bytes_in_crlf_destination() {
        let fixture = TestFixture::new().unwrap();
        let existing = crlf_existing_view();
        fixture.with_destination(&existing).unwrap();
        let servers = fixture.with_source("servers.rdg", SERVERS_RDG).unwrap();
        let edge = fixture.with_source("edge.rdg", &rdg("Edge", &server("fw1"))).unwrap();

        let (result, _) = import(&fixture, vec![servers, edge], &options());
        assert_eq!(result.unwrap().imported, vec!["Edge".to_string()]);

        let after = fixture.read_destination();
        let root_close = existing.find("  </item>\r\n</CustomView>").unwrap();
        assert!(after.starts_with(&existing[..root_close]));
        assert!(after.ends_with(&existing[root_close..]));
        assert!(after.contains(
            "    <item name=\"Servers\" text=\"Servers\" imageindex=\"0\">\r\n      <item name=\"old.local\" text=\"Old box\" imageindex=\"2\" />\r\n    </item>\r\n"
        ));
        assert!(after.contains("      <item name=\"fw1\" text=\"fw1\" imageindex=\"2\"/>\r\n"));
        assert!(!after.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_backup_matches_previous_destination() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_destination(EXISTING_VIEW).unwrap();
        let source = fixture.with_source("ops.rdg", &rdg("Ops", &group("Web", &server("web1")))).unwrap();

        let (result, _) = import(&fixture, vec![source], &options());
        let summary = result.unwrap();

        let backups = fixture.backups();
        assert_eq!(backups.len(), 1);
        assert_eq!(summary.backup.as_ref(), Some(&backups[0]));
        assert_eq!(fs::read(&backups[0]).unwrap(), EXISTING_VIEW.as_bytes());
        assert!(fixture.read_destination().contains(r#"<item name="web1" text="web1" imageindex="2"/>"#));
    }

    #[test]
    fn test_invalid_sources_are_skipped() {
        let fixture = TestFixture::new().unwrap();
        let foreign = fixture.with_source("view.rdg", EXISTING_VIEW).unwrap();
        let broken = fixture.with_source("broken.rdg", "<RDCMan><file>").unwrap();
        let good = fixture.with_source("good.rdg", SERVERS_RDG).unwrap();

        let (result, events) = import(&fixture, vec![foreign.clone(), broken.clone(), good], &options());
        let summary = result.unwrap();

        assert_eq!(summary.imported, vec!["Servers".to_string()]);
        assert_eq!(summary.rejected, vec![foreign, broken]);
        assert_eq!(warnings(&events).len(), 2);
    }

    #[test]
    fn test_no_valid_sources_aborts_before_touching_destination() {
        let fixture = TestFixture::new().unwrap();
        let foreign = fixture.with_source("view.rdg", EXISTING_VIEW).unwrap();
        let missing = fixture.sources.join("missing.rdg");

        let (result, events) = import(&fixture, vec![foreign, missing], &options());

        assert!(matches!(result, Err(ImportError::NoValidSources(2))));
        assert!(!fixture.destination().exists());
        assert!(events.iter().any(|e| e.level == LogLevel::Error));
        assert_footer(&events);
    }

    #[test]
    fn test_no_unique_sources_aborts_without_backup() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_destination(EXISTING_VIEW).unwrap();
        let servers = fixture.with_source("servers.rdg", SERVERS_RDG).unwrap();
        let lab = fixture.with_source("lab.rdg", &rdg("Lab", "")).unwrap();

        let (result, events) = import(&fixture, vec![servers, lab], &options());

        assert!(matches!(result, Err(ImportError::NoUniqueSources)));
        assert_eq!(fixture.read_destination(), EXISTING_VIEW);
        assert!(fixture.backups().is_empty());
        assert_eq!(warnings(&events).len(), 2);
        assert_footer(&events);
    }

    #[test]
    fn test_empty_selection_aborts() {
        let fixture = TestFixture::new().unwrap();

        let (result, events) = import(&fixture, vec![], &options());

        assert!(matches!(result, Err(ImportError::NoSourcesSelected)));
        let error = events.iter().find(|e| e.level == LogLevel::Error).unwrap();
        assert!(error.message.contains("no source files were selected"));
        assert_footer(&events);
    }

    #[test]
    fn test_invalid_destination_is_fatal() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_destination("<Views><item name=\"Root\"/></Views>").unwrap();
        let source = fixture.with_source("servers.rdg", SERVERS_RDG).unwrap();

        let (result, _) = import(&fixture, vec![source], &options());

        assert!(matches!(result, Err(ImportError::InvalidFormat { .. })));
        assert_eq!(fixture.read_destination(), "<Views><item name=\"Root\"/></Views>");
        assert!(fixture.backups().is_empty());
    }

    #[test]
    fn test_duplicate_root_names_in_one_run() {
        let fixture = TestFixture::new().unwrap();
        let first = fixture.with_source("a.rdg", &rdg("Shared", &server("one"))).unwrap();
        let second = fixture.with_source("b.rdg", &rdg("Shared", &server("two"))).unwrap();

        let (result, events) = import(&fixture, vec![first, second], &options());
        let summary = result.unwrap();

        assert_eq!(summary.imported, vec!["Shared".to_string()]);
        assert_eq!(summary.collisions, vec!["Shared".to_string()]);
        assert!(warnings(&events)[0].contains("already uses that name"));
        assert!(fixture.read_destination().contains("\"one\""));
        assert!(!fixture.read_destination().contains("\"two\""));
    }

    #[test]
    fn test_directory_source_expands_to_rdg_files() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_source("b.rdg", &rdg("Beta", "")).unwrap();
        fixture.with_source("a.rdg", &rdg("Alpha", "")).unwrap();
        fixture.with_source("readme.txt", "not a source").unwrap();

        let (result, _) = import(&fixture, vec![fixture.sources.clone()], &options());

        assert_eq!(result.unwrap().imported, vec!["Alpha".to_string(), "Beta".to_string()]);
    }

    #[test]
    fn test_contains_matching_skips_partial_names() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_destination(EXISTING_VIEW).unwrap();
        let source = fixture.with_source("serv.rdg", &rdg("Serv", "")).unwrap();
        let options = ImportOptions { matching: NameMatching::Contains, ..options() };

        let (result, _) = import(&fixture, vec![source], &options);

        assert!(matches!(result, Err(ImportError::NoUniqueSources)));
    }

    #[test]
    fn test_dry_run_leaves_disk_untouched() {
        let fixture = TestFixture::new().unwrap();
        fixture.with_destination(EXISTING_VIEW).unwrap();
        let source = fixture.with_source("edge.rdg", &rdg("Edge", &server("fw1"))).unwrap();
        let options = ImportOptions { dry_run: true, ..options() };

        let (result, _) = import(&fixture, vec![source], &options);
        let summary = result.unwrap();

        let preview = summary.preview.unwrap();
        assert!(preview.contains(r#"<item name="Edge" text="Edge" imageindex="0">"#));
        assert_eq!(fixture.read_destination(), EXISTING_VIEW);
        assert!(fixture.backups().is_empty());
        assert!(summary.backup.is_none());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let fixture = TestFixture::new().unwrap();
        let source = fixture.with_source("servers.rdg", SERVERS_RDG).unwrap();
        let blocker = fixture.temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut selection = PathSelection::new(vec![source], blocker);
        let mut events: Vec<LogEvent> = Vec::new();
        let result = run_import(&mut selection, &options(), &mut events);

        assert!(matches!(result, Err(ImportError::SaveFailed { .. })));
        assert_footer(&events);
    }
}
