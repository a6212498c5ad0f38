use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use phonedeck::cluster::{
    compute_stats, create_item, Cluster, ClusterRef, Item, ItemFields, ItemKind, JobState,
    PhoneRef,
};
use phonedeck::error::DeckError;
use phonedeck::store;

fn root(name: &str) -> ClusterRef {
    Rc::new(RefCell::new(Cluster {
        name: name.to_string(),
        desc: "all devices".to_string(),
        ..Default::default()
    }))
}

fn add_cluster(parent: &ClusterRef, name: &str) -> ClusterRef {
    let fields = ItemFields {
        name: name.to_string(),
        desc: "zone".to_string(),
        ..Default::default()
    };
    match create_item(parent, ItemKind::Cluster, fields).unwrap() {
        Item::Cluster(cluster) => cluster,
        _ => unreachable!(),
    }
}

fn add_phone(parent: &ClusterRef, name: &str, ram: &str, cpu: &str) -> PhoneRef {
    let fields = ItemFields {
        name: name.to_string(),
        desc: "lab device".to_string(),
        ram: ram.to_string(),
        cpu: cpu.to_string(),
        cpu_speed: "2.4GHz".to_string(),
    };
    match create_item(parent, ItemKind::Phone, fields).unwrap() {
        Item::Phone(phone) => phone,
        _ => unreachable!(),
    }
}

#[test]
fn test_round_trip_preserves_structure_and_resets_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters.json");

    let fleet = root("fleet");
    let edge = add_cluster(&fleet, "edge");
    add_phone(&edge, "pixel-7", "8GB", "4 Cores");
    add_phone(&edge, "galaxy", "4GB", "2 Cores");
    compute_stats(&fleet);
    // a running job at save time must come back stopped
    edge.borrow_mut().start_job();
    edge.borrow_mut().job_progress = 0.6;

    store::save(&fleet, &path).unwrap();
    let loaded = store::load(&path).unwrap();

    let loaded_ref = loaded.borrow();
    assert_eq!(loaded_ref.name, "fleet");
    assert_eq!(loaded_ref.desc, "all devices");
    assert_eq!(loaded_ref.children_clusters.len(), 1);
    assert_eq!(loaded_ref.stats.avg_ram, 6.0);

    let edge = loaded_ref.children_clusters[0].clone();
    let edge_ref = edge.borrow();
    assert_eq!(edge_ref.name, "edge");
    assert_eq!(edge_ref.job, JobState::Stopped);
    assert_eq!(edge_ref.job_progress, 0.0);
    assert_eq!(edge_ref.children_phones.len(), 2);
    assert_eq!(edge_ref.children_phones[0].borrow().name, "pixel-7");
    assert_eq!(edge_ref.children_phones[0].borrow().ram, "8GB");
    assert_eq!(edge_ref.children_phones[1].borrow().cpu, "2 Cores");

    // back-references point at the true structural parents
    let parent = edge_ref.parent.upgrade().unwrap();
    assert!(Rc::ptr_eq(&parent, &loaded));
    let owner = edge_ref.children_phones[0].borrow().cluster.upgrade().unwrap();
    assert!(Rc::ptr_eq(&owner, &edge));
    assert!(loaded_ref.parent.upgrade().is_none());
}

#[test]
fn test_missing_file_seeds_an_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let loaded = store::load(&path).unwrap();
    assert!(loaded.borrow().name.is_empty());
    assert!(loaded.borrow().children_clusters.is_empty());
    assert!(loaded.borrow().children_phones.is_empty());

    // the empty object lands on disk right away
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    store::load(&path).unwrap();
}

#[test]
fn test_malformed_file_is_an_error_and_stays_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{not json").unwrap();

    let err = store::load(&path).unwrap_err();
    assert!(matches!(err, DeckError::Parse(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
}

#[test]
fn test_unreadable_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    // a directory cannot be read as a file and is not "missing"
    let err = store::load(dir.path()).unwrap_err();
    assert!(matches!(err, DeckError::Io(_)));
}

#[test]
fn test_saved_form_omits_job_state_and_back_references() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters.json");

    let fleet = root("fleet");
    let edge = add_cluster(&fleet, "edge");
    add_phone(&edge, "pixel-7", "8GB", "4 Cores");
    edge.borrow_mut().start_job();
    store::save(&fleet, &path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let edge_value = &value["children_clusters"][0];
    let edge_keys = edge_value.as_object().unwrap();
    assert!(!edge_keys.contains_key("job"));
    assert!(!edge_keys.contains_key("job_progress"));
    assert!(!edge_keys.contains_key("parent"));
    // Stats is always present, even before any aggregation ran
    assert!(edge_keys.contains_key("Stats"));

    let phone_keys = edge_value["children_phones"][0].as_object().unwrap();
    for key in phone_keys.keys() {
        assert!(
            matches!(key.as_str(), "Name" | "Desc" | "RAM" | "CPU" | "CPUSpeed"),
            "unexpected phone key {}",
            key
        );
    }
}

#[test]
fn test_huge_magnitude_descriptor_still_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clusters.json");

    let fleet = root("fleet");
    let edge = add_cluster(&fleet, "edge");
    let huge = format!("{}GB", "9".repeat(320));
    add_phone(&edge, "hoarder", &huge, "4 Cores");
    compute_stats(&fleet);
    // an overflowing descriptor contributes zero, never a non-finite value
    assert_eq!(fleet.borrow().stats.avg_ram, 0.0);

    store::save(&fleet, &path).unwrap();
    let loaded = store::load(&path).unwrap();
    let loaded_ref = loaded.borrow();
    assert_eq!(loaded_ref.stats.avg_ram, 0.0);
    let edge = loaded_ref.children_clusters[0].clone();
    assert_eq!(edge.borrow().children_phones[0].borrow().ram, huge);
}

#[test]
fn test_second_round_trip_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let fleet = root("fleet");
    let edge = add_cluster(&fleet, "edge");
    add_phone(&edge, "pixel-7", "8GB", "4 Cores");
    compute_stats(&fleet);

    store::save(&fleet, &first).unwrap();
    let loaded = store::load(&first).unwrap();
    store::save(&loaded, &second).unwrap();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}
