//! Checkpoint Tests - Save/Load Generator State
//!
//! Critical invariants tested:
//! - Determinism: a restored manager produces a bit-identical sample stream
//! - Mandatory engine state: its absence fails hard and mutates nothing
//! - Graceful degradation: missing distribution sections keep defaults
//! - Discard handling: persisted only on request, restored as Warmed

use std::fs;
use std::path::Path;

use serde_json::Value;

use reproducible_rng_core_rs::{
    LoadStatus, ManagerConfig, RngError, RngManager, SeedStatus,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn manager() -> RngManager {
    RngManager::new(ManagerConfig::default())
}

/// Manager with a fully exercised state: full-width seed, custom limits,
/// explicit warm-up, and a cached Box-Muller spare (odd draw count).
fn exercised_manager() -> RngManager {
    let mut rng = manager();
    let mut next = 1000u64;
    rng.seed_from_generator(|| {
        next += 13;
        next
    });
    rng.set_normal_limits(2.5, 0.75);
    rng.set_uniform_limits(-1.0, 3.0);
    rng.warm_up_by(17);
    rng.sample_normal(); // leaves a latent deviate pending
    rng
}

fn remove_section(path: &Path, section: &str) {
    let text = fs::read_to_string(path).unwrap();
    let mut value: Value = serde_json::from_str(&text).unwrap();
    value.as_object_mut().unwrap().remove(section);
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

// ============================================================================
// Round-Trip
// ============================================================================

#[test]
fn test_roundtrip_reproduces_identical_sample_streams() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut original = exercised_manager();
    original.save_checkpoint(&path, true).unwrap();

    let mut restored = manager();
    assert_eq!(restored.load_checkpoint(&path, true), Ok(LoadStatus::Success));

    assert_eq!(restored.discard_length(), original.discard_length());
    for _ in 0..20 {
        assert_eq!(restored.sample_normal(), original.sample_normal());
        assert_eq!(restored.sample_uniform(), original.sample_uniform());
    }
}

#[test]
fn test_roundtrip_restores_distribution_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let original = exercised_manager();
    original.save_checkpoint(&path, false).unwrap();

    let mut restored = manager();
    restored.load_checkpoint(&path, false).unwrap();

    assert_eq!(restored.normal_limits(), (2.5, 0.75));
    assert_eq!(restored.uniform_limits(), (-1.0, 3.0));
}

#[test]
fn test_loading_same_file_twice_gives_identical_managers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    exercised_manager().save_checkpoint(&path, true).unwrap();

    let mut a = manager();
    let mut b = manager();
    a.load_checkpoint(&path, true).unwrap();
    b.load_checkpoint(&path, true).unwrap();

    assert_eq!(a.seed_fingerprint(), b.seed_fingerprint());
    for _ in 0..10 {
        assert_eq!(a.sample_normal(), b.sample_normal());
    }
}

// ============================================================================
// Path Handling
// ============================================================================

#[test]
fn test_save_appends_canonical_extension() {
    let dir = tempfile::tempdir().unwrap();
    let bare = dir.path().join("state");

    let rng = exercised_manager();
    let written = rng.save_checkpoint(&bare, false).unwrap();

    assert_eq!(written, dir.path().join("state.json"));
    assert!(written.exists());
    assert!(!bare.exists(), "the bare path must not be written");
}

#[test]
fn test_save_keeps_existing_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let written = exercised_manager().save_checkpoint(&path, false).unwrap();
    assert_eq!(written, path);
}

#[test]
fn test_load_missing_file_is_file_error() {
    let mut rng = manager();
    let result = rng.load_checkpoint("/nonexistent/state.json", false);
    assert!(matches!(result, Err(RngError::File(_))));
}

#[test]
fn test_load_malformed_file_is_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "not json at all {").unwrap();

    let mut rng = manager();
    assert!(matches!(rng.load_checkpoint(&path, false), Err(RngError::File(_))));
}

// ============================================================================
// Missing Sections
// ============================================================================

#[test]
fn test_missing_engine_state_fails_and_mutates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    exercised_manager().save_checkpoint(&path, true).unwrap();
    remove_section(&path, "engine_state");

    let mut rng = manager();
    rng.seed_with_value(7);
    rng.warm_up_by(3);
    let fingerprint = rng.seed_fingerprint();

    let result = rng.load_checkpoint(&path, true);

    assert_eq!(result, Err(RngError::SeedNotFound));
    assert_eq!(rng.seed_words(), &[7], "prior record must survive");
    assert_eq!(rng.seed_fingerprint(), fingerprint);
    assert_eq!(rng.discard_length(), 3);
    assert_eq!(rng.normal_limits(), (0.0, 1.0));
}

#[test]
fn test_missing_uni_state_degrades_but_restores_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut original = exercised_manager();
    original.save_checkpoint(&path, false).unwrap();
    remove_section(&path, "uni_state");

    let snapshot: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let engine_words: Vec<u64> = snapshot["engine_state"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w.as_u64().unwrap())
        .collect();

    let mut restored = manager();
    let status = restored.load_checkpoint(&path, false);

    assert_eq!(status, Ok(LoadStatus::DistStateNotFound));
    assert_eq!(
        restored.uniform_limits(),
        (0.0, 1.0),
        "missing section keeps the default bounds"
    );
    assert_eq!(restored.normal_limits(), (2.5, 0.75), "present section still restores");
    assert_eq!(restored.seed_words(), &engine_words[..], "engine words become the record");

    // The engine position itself is restored exactly.
    assert_eq!(restored.sample_normal(), original.sample_normal());
}

#[test]
fn test_missing_gauss_state_degrades_too() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    exercised_manager().save_checkpoint(&path, false).unwrap();
    remove_section(&path, "gauss_state");

    let mut restored = manager();
    assert_eq!(restored.load_checkpoint(&path, false), Ok(LoadStatus::DistStateNotFound));
    assert_eq!(restored.normal_limits(), (0.0, 1.0));
    assert_eq!(restored.uniform_limits(), (-1.0, 3.0));
}

#[test]
fn test_short_engine_state_is_treated_as_seed_material() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        serde_json::to_string_pretty(&serde_json::json!({
            "engine_state": [1, 2, 3],
            "gauss_state": { "location": 0.0, "scale": 1.0, "latent": null },
            "uni_state": { "lower": 0.0, "upper": 1.0 },
        }))
        .unwrap(),
    )
    .unwrap();

    let mut rng = manager();
    let status = rng.load_checkpoint(&path, false);

    assert_eq!(status, Ok(LoadStatus::EntropyShortage));
    assert_eq!(rng.seed_words(), &[1, 2, 3]);
    assert_eq!(rng.seed_status(), SeedStatus::EntropyShortage);
}

#[test]
fn test_missing_dist_outranks_entropy_shortage() {
    // Taxonomy precedence: DistStateNotFound is reported even when the
    // engine words also ran short.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        serde_json::to_string_pretty(&serde_json::json!({ "engine_state": [1, 2, 3] })).unwrap(),
    )
    .unwrap();

    let mut rng = manager();
    assert_eq!(rng.load_checkpoint(&path, false), Ok(LoadStatus::DistStateNotFound));
    assert_eq!(rng.seed_status(), SeedStatus::EntropyShortage);
}

#[test]
fn test_empty_engine_state_is_seed_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        serde_json::to_string_pretty(&serde_json::json!({ "engine_state": [] })).unwrap(),
    )
    .unwrap();

    let mut rng = manager();
    rng.seed_with_value(7);
    assert_eq!(rng.load_checkpoint(&path, false), Err(RngError::SeedNotFound));
    assert_eq!(rng.seed_words(), &[7]);
}

#[test]
fn test_unusable_dist_parameters_degrade_like_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut original = exercised_manager();
    original.save_checkpoint(&path, false).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut value: Value = serde_json::from_str(&text).unwrap();
    value["uni_state"]["upper"] = serde_json::json!(-10.0); // upper < lower
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    let mut restored = manager();
    assert_eq!(restored.load_checkpoint(&path, false), Ok(LoadStatus::DistStateNotFound));
    assert_eq!(restored.uniform_limits(), (0.0, 1.0));
}

// ============================================================================
// Discard Handling
// ============================================================================

#[test]
fn test_discard_omitted_unless_requested() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let rng = exercised_manager();
    rng.save_checkpoint(&path, false).unwrap();

    let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(value.get("discard").is_none());
}

#[test]
fn test_discard_written_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let rng = exercised_manager();
    rng.save_checkpoint(&path, true).unwrap();

    let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["discard"].as_u64(), Some(17));
}

#[test]
fn test_restored_discard_marks_manager_warmed() {
    // The persisted engine words already embed every applied discard, so
    // restoring must not re-apply it: warm_up() is a gated no-op and the
    // stream continues exactly where the original left off.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut original = exercised_manager();
    original.save_checkpoint(&path, true).unwrap();

    let mut restored = manager();
    restored.load_checkpoint(&path, true).unwrap();

    assert!(restored.warmed_up());
    assert_eq!(restored.warm_up(), Ok(0));
    assert_eq!(restored.sample_uniform(), original.sample_uniform());
}

#[test]
fn test_discard_field_ignored_without_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    exercised_manager().save_checkpoint(&path, true).unwrap();

    let mut restored = manager();
    restored.load_checkpoint(&path, false).unwrap();

    assert_eq!(restored.discard_length(), 0, "discard restore is opt-in");
    assert!(!restored.warmed_up());
}

#[test]
fn test_checkpoint_into_seeded_manager_replaces_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut original = exercised_manager();
    original.save_checkpoint(&path, true).unwrap();

    let mut other = manager();
    other.seed_with_value(1);
    other.warm_up_by(100);
    other.load_checkpoint(&path, true).unwrap();

    assert_eq!(other.discard_length(), 17);
    assert_eq!(other.sample_uniform(), original.sample_uniform());
}
