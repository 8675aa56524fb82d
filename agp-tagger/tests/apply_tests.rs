//! Apply orchestrator tests
//!
//! Write/rename/organize sequencing, failure policy, counters and ordering
//! of the APPLYING phase against a recording mock library.

mod helpers;

use agp_tagger::models::{AppSettings, Confidence, FileApplyState, StepOutcome};
use helpers::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn house(artist: Option<&str>) -> agp_tagger::models::MetadataResult {
    suggestion(Some("House"), artist, Confidence::High, "X")
}

/// TC-APP-001: Output order equals input order, skipped files included
#[tokio::test]
async fn tc_app_001_order_preserved() {
    // Given: Annotated, unannotated and empty-top files interleaved
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let files = vec![
        annotated("/m/c.mp3", metadata(Some("C"), Some("3"), None), vec![house(None)]),
        audio_file("/m/a.mp3", None),
        annotated(
            "/m/b.mp3",
            metadata(Some("B"), Some("2"), None),
            vec![suggestion(None, None, Confidence::Low, "Y (No match)")],
        ),
        annotated("/m/d.mp3", metadata(Some("D"), Some("4"), None), vec![house(None)]),
    ];

    // When: Apply runs with default settings
    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            files,
            &AppSettings::default(),
            None,
            &CancellationToken::new(),
        )
        .await;

    // Then: Same order, skips count toward nothing
    let names: Vec<_> = outcome.files.iter().map(|f| f.file.filename.as_str()).collect();
    assert_eq!(names, vec!["c.mp3", "a.mp3", "b.mp3", "d.mp3"]);
    assert_eq!(outcome.report.success_count, 2);
    assert_eq!(outcome.report.failure_count, 0);
    assert_eq!(outcome.report.outcomes[1].state, FileApplyState::Skipped);
    assert_eq!(outcome.report.outcomes[2].state, FileApplyState::Skipped);
    assert_eq!(outcome.report.message(), "Successfully updated 2 files");
}

/// TC-APP-002: Effective metadata overrides genre/artist and carries the rest
#[tokio::test]
async fn tc_app_002_effective_metadata_written() {
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let mut current = metadata(Some("daft punk"), Some("One More Time"), Some("Pop"));
    current.album = Some("Discovery".to_string());
    current.year = Some(2001);
    current.bpm = Some(123);
    let files = vec![annotated("/m/a.mp3", current, vec![house(Some("Daft Punk"))])];

    let settings = AppSettings {
        backup_before_changes: false,
        ..Default::default()
    };
    let outcome = orchestrator
        .execute_apply(Uuid::new_v4(), files, &settings, None, &CancellationToken::new())
        .await;

    let written = outcome.files[0].file.current_metadata.clone().unwrap();
    assert_eq!(written.genre.as_deref(), Some("House"));
    assert_eq!(written.artist.as_deref(), Some("Daft Punk"));
    assert_eq!(written.title.as_deref(), Some("One More Time"));
    assert_eq!(written.album.as_deref(), Some("Discovery"));
    assert_eq!(written.year, Some(2001));
    assert_eq!(written.bpm, Some(123));

    // The backup flag is passed through from settings
    assert_eq!(
        library.calls(),
        vec![LibraryCall::Update {
            path: PathBuf::from("/m/a.mp3"),
            metadata: written,
            backup: false,
        }]
    );
}

/// TC-APP-003: A failed write is terminal; rename never attempted
#[tokio::test]
async fn tc_app_003_write_failure_with_rename_enabled() {
    // Given: Rename enabled, write fails for the only file
    let library = Arc::new(MockLibrary::new().fail_write("/m/song.mp3"));
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let before = metadata(Some("Daft Punk"), Some("One More Time"), None);
    let files = vec![annotated("/m/song.mp3", before.clone(), vec![house(Some("Daft Punk"))])];
    let settings = AppSettings {
        rename_files: true,
        organize_files: true,
        ..Default::default()
    };

    // When: Apply runs
    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            files,
            &settings,
            Some(Path::new("/m")),
            &CancellationToken::new(),
        )
        .await;

    // Then: Metadata and path unchanged, one error naming the file
    let entry = &outcome.files[0];
    assert_eq!(entry.file.current_metadata, Some(before));
    assert_eq!(entry.file.path, PathBuf::from("/m/song.mp3"));
    assert_eq!(entry.file.filename, "song.mp3");
    assert_eq!(outcome.report.failure_count, 1);
    assert_eq!(outcome.report.success_count, 0);
    assert_eq!(outcome.report.errors.len(), 1);
    assert!(outcome.report.errors[0].starts_with("song.mp3: "));
    assert!(matches!(
        outcome.report.outcomes[0].state,
        FileApplyState::WriteFailed { .. }
    ));
    assert_eq!(library.renames(), 0);
    assert_eq!(library.calls().len(), 1);
    assert_eq!(outcome.report.message(), "Successfully updated 0 files, 1 failed");
}

/// TC-APP-004: Rename and organize update the path and count organized files
#[tokio::test]
async fn tc_app_004_rename_then_organize() {
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let files = vec![annotated(
        "/m/in/track01.mp3",
        metadata(Some("Daft Punk"), Some("Aerodynamic"), None),
        vec![house(None)],
    )];
    let settings = AppSettings {
        rename_files: true,
        organize_files: true,
        ..Default::default()
    };

    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            files,
            &settings,
            Some(Path::new("/m")),
            &CancellationToken::new(),
        )
        .await;

    let entry = &outcome.files[0];
    assert_eq!(entry.file.path, PathBuf::from("/m/House/Daft Punk - Aerodynamic.mp3"));
    assert_eq!(entry.file.filename, "Daft Punk - Aerodynamic.mp3");
    assert_eq!(outcome.report.organized_count, 1);
    assert_eq!(
        outcome.report.message(),
        "Successfully updated 1 files, organized 1 into folders"
    );

    // Organize receives the renamed path and the configured pattern
    let calls = library.calls();
    assert_eq!(calls[1], LibraryCall::Rename(PathBuf::from("/m/in/track01.mp3")));
    assert_eq!(
        calls[2],
        LibraryCall::Organize {
            path: PathBuf::from("/m/in/Daft Punk - Aerodynamic.mp3"),
            base: PathBuf::from("/m"),
            pattern: "{genre}".to_string(),
        }
    );
}

/// TC-APP-005: Rename/organize failures are non-fatal and keep the write
#[tokio::test]
async fn tc_app_005_optional_step_failures_keep_success() {
    let library = Arc::new(
        MockLibrary::new()
            .fail_rename("/m/a.mp3")
            .fail_organize("/m/a.mp3"),
    );
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let files = vec![annotated("/m/a.mp3", metadata(Some("A"), Some("T"), None), vec![house(None)])];
    let settings = AppSettings {
        rename_files: true,
        organize_files: true,
        ..Default::default()
    };

    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            files,
            &settings,
            Some(Path::new("/m")),
            &CancellationToken::new(),
        )
        .await;

    let entry = &outcome.files[0];
    assert_eq!(entry.file.path, PathBuf::from("/m/a.mp3"));
    assert_eq!(
        entry.file.current_metadata.as_ref().and_then(|m| m.genre.as_deref()),
        Some("House")
    );
    assert_eq!(outcome.report.success_count, 1);
    assert_eq!(outcome.report.failure_count, 0);
    assert_eq!(outcome.report.organized_count, 0);
    assert!(outcome.report.errors.is_empty());
    match &outcome.report.outcomes[0].state {
        FileApplyState::Done { rename, organize } => {
            assert!(matches!(rename, StepOutcome::Failed(_)));
            assert!(matches!(organize, StepOutcome::Failed(_)));
        }
        other => panic!("unexpected state {:?}", other),
    }
}

/// TC-APP-006: Organize needs a known base folder
#[tokio::test]
async fn tc_app_006_organize_without_base_folder() {
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let files = vec![annotated("/m/a.mp3", metadata(Some("A"), Some("T"), None), vec![house(None)])];
    let settings = AppSettings {
        organize_files: true,
        ..Default::default()
    };

    let outcome = orchestrator
        .execute_apply(Uuid::new_v4(), files, &settings, None, &CancellationToken::new())
        .await;

    assert_eq!(library.calls().len(), 1);
    assert_eq!(
        outcome.report.outcomes[0].state,
        FileApplyState::Done {
            rename: StepOutcome::NotRequested,
            organize: StepOutcome::NotRequested,
        }
    );
}

/// TC-APP-007: A user genre override is applied even over an empty top suggestion
#[tokio::test]
async fn tc_app_007_selected_genre_override() {
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let mut overridden = annotated(
        "/m/a.mp3",
        metadata(Some("A"), Some("T"), Some("Pop")),
        vec![suggestion(None, None, Confidence::Low, "X (No match)")],
    );
    overridden.selected_genre = Some("Nu Disco".to_string());

    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            vec![overridden],
            &AppSettings::default(),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.report.success_count, 1);
    assert_eq!(
        outcome.files[0].file.current_metadata.as_ref().and_then(|m| m.genre.as_deref()),
        Some("Nu Disco")
    );
}

/// TC-APP-008: Mixed batch; failures never stop later files
#[tokio::test]
async fn tc_app_008_failures_do_not_stop_batch() {
    let library = Arc::new(MockLibrary::new().fail_write("/m/1.mp3").fail_write("/m/3.mp3"));
    let (orchestrator, reporter, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let files = (1..=4)
        .map(|i| {
            annotated(
                &format!("/m/{}.mp3", i),
                metadata(Some("A"), Some(&i.to_string()), None),
                vec![house(None)],
            )
        })
        .collect();

    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            files,
            &AppSettings::default(),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.report.success_count, 2);
    assert_eq!(outcome.report.failure_count, 2);
    assert_eq!(outcome.report.errors.len(), 2);
    assert!(outcome.report.errors[0].starts_with("1.mp3: "));
    assert!(outcome.report.errors[1].starts_with("3.mp3: "));
    assert!(outcome.files[0].file.current_metadata.as_ref().unwrap().genre.is_none());
    assert_eq!(
        outcome.files[1].file.current_metadata.as_ref().unwrap().genre.as_deref(),
        Some("House")
    );

    let snapshot = reporter.snapshot().await;
    assert_eq!(snapshot.progress, 100.0);
    assert_eq!(snapshot.status, "Successfully updated 2 files, 2 failed");
}

/// TC-APP-009: Cancellation leaves unreached files untouched
#[tokio::test]
async fn tc_app_009_cancelled_before_start() {
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, reporter, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let token = CancellationToken::new();
    token.cancel();
    let files = vec![
        annotated("/m/1.mp3", metadata(Some("A"), Some("1"), None), vec![house(None)]),
        annotated("/m/2.mp3", metadata(Some("A"), Some("2"), None), vec![house(None)]),
    ];

    let outcome = orchestrator
        .execute_apply(Uuid::new_v4(), files, &AppSettings::default(), None, &token)
        .await;

    assert!(outcome.report.cancelled);
    assert!(library.calls().is_empty());
    assert_eq!(outcome.files.len(), 2);
    assert_eq!(outcome.report.message(), "Successfully updated 0 files (cancelled)");
    assert_eq!(reporter.snapshot().await.progress, 0.0);
}

/// TC-APP-010: A file already in its genre folder is not counted as organized
#[tokio::test]
async fn tc_app_010_already_in_place_not_organized() {
    // Given: A file already under <base>/House with a House suggestion
    let library = Arc::new(MockLibrary::new());
    let (orchestrator, _, _) = orchestrator(library.clone(), Arc::new(MockLookup::new()));
    let files = vec![annotated(
        "/m/House/a.mp3",
        metadata(Some("A"), Some("1"), None),
        vec![house(None)],
    )];
    let settings = AppSettings {
        organize_files: true,
        ..Default::default()
    };

    // When: Apply runs with organize enabled and base /m
    let outcome = orchestrator
        .execute_apply(
            Uuid::new_v4(),
            files,
            &settings,
            Some(Path::new("/m")),
            &CancellationToken::new(),
        )
        .await;

    // Then: The write counts, the no-op move does not
    assert_eq!(outcome.report.success_count, 1);
    assert_eq!(outcome.report.organized_count, 0);
    assert_eq!(outcome.report.message(), "Successfully updated 1 files");
    assert_eq!(
        outcome.report.outcomes[0].state,
        FileApplyState::Done {
            rename: StepOutcome::NotRequested,
            organize: StepOutcome::Unchanged,
        }
    );
    assert_eq!(outcome.files[0].file.path, PathBuf::from("/m/House/a.mp3"));
}
