//! Integration tests for the directory → root pipeline.

use merkle_snapshot::tree::leaves;
use merkle_snapshot::{Config, ContentMode, Hash, MerkleTree, Snapshot};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn populate(root: &Path) {
    write(root, "src/main.c", "int main() { return 0; }\n");
    write(root, "src/util.h", "#pragma once\n");
    write(root, "src/util.c", "#include \"util.h\"\n");
    write(root, "scripts/build.sh", "make\n");
    write(root, "README", "not code");
}

fn source_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());
    temp_dir
}

fn code_config() -> Config {
    Config {
        include_extensions: vec!["c".into(), "h".into(), "sh".into()],
        ..Config::default()
    }
}

#[tokio::test]
async fn test_capture_matches_manual_construction() {
    let temp_dir = source_tree();
    let root = temp_dir.path();
    let mut snapshot = Snapshot::capture(root, &code_config()).await.unwrap();

    let names: Vec<_> = snapshot
        .files()
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["scripts/build.sh", "src/main.c", "src/util.c", "src/util.h"]
    );

    let digests: Vec<Hash> = snapshot
        .files()
        .iter()
        .map(|p| Hash::digest(fs::read(p).unwrap()))
        .collect();
    // identity + 4 files = 5 leaves, padded to 8
    let assembled = leaves::assemble(Hash::ZERO, digests);
    assert_eq!(assembled.len(), 8);
    let mut expected = MerkleTree::build(assembled).unwrap();

    assert_eq!(snapshot.tree().len(), 8);
    assert_eq!(snapshot.root(), expected.root());
    assert_eq!(snapshot.version().unwrap(), Hash::ZERO);
}

#[tokio::test]
async fn test_capture_is_reproducible() {
    let temp_dir = source_tree();
    let mut first = Snapshot::capture(temp_dir.path(), &code_config()).await.unwrap();
    let mut second = Snapshot::capture(temp_dir.path(), &code_config()).await.unwrap();
    let expected = second.root();
    assert!(first.check(&expected));
    assert!(!first.check(&Hash::ZERO));
}

#[tokio::test]
async fn test_empty_directory_is_a_single_leaf() {
    let temp_dir = TempDir::new().unwrap();
    let mut snapshot = Snapshot::capture(temp_dir.path(), &Config::default())
        .await
        .unwrap();
    assert!(snapshot.files().is_empty());
    assert_eq!(snapshot.tree().len(), 1);
    assert_eq!(snapshot.root(), Hash::ZERO);
}

#[tokio::test]
async fn test_set_version_touches_only_leaf_zero() {
    let temp_dir = source_tree();
    let mut snapshot = Snapshot::capture(temp_dir.path(), &code_config()).await.unwrap();
    let before: Vec<Hash> = snapshot.tree().leaves().collect();

    let version = Hash::digest(b"v2");
    let root = snapshot.set_version(version).unwrap();
    assert_eq!(snapshot.tree().recomputed_nodes(), 3);

    let mut expected_leaves = before.clone();
    expected_leaves[0] = version;
    let mut expected = MerkleTree::build(expected_leaves).unwrap();
    assert_eq!(root, expected.root());
    // the padding copy at leaf 5 keeps the construction-time identity
    assert_eq!(snapshot.tree().leaf(5).unwrap(), Hash::ZERO);
    assert_eq!(snapshot.version().unwrap(), version);
}

#[tokio::test]
async fn test_refresh_file_matches_fresh_capture() {
    let temp_dir = source_tree();
    let root = temp_dir.path();
    let mut snapshot = Snapshot::capture(root, &code_config()).await.unwrap();
    let before = snapshot.root();

    // scripts/build.sh is file 0 -> leaf 1, which is also copied to leaf 6
    write(root, "scripts/build.sh", "make all\n");
    let refreshed = snapshot
        .refresh_file(Path::new("scripts/build.sh"))
        .await
        .unwrap();
    assert_ne!(refreshed, before);
    assert_eq!(snapshot.tree().leaf(1).unwrap(), snapshot.tree().leaf(6).unwrap());

    let mut fresh = Snapshot::capture(root, &code_config()).await.unwrap();
    assert_eq!(refreshed, fresh.root());
}

#[tokio::test]
async fn test_refresh_unknown_file_fails() {
    let temp_dir = source_tree();
    let mut snapshot = Snapshot::capture(temp_dir.path(), &code_config()).await.unwrap();
    let before = snapshot.root();
    assert!(snapshot.refresh_file(Path::new("README")).await.is_err());
    assert_eq!(snapshot.root(), before);
}

#[tokio::test]
async fn test_prove_every_file() {
    let temp_dir = source_tree();
    let root = temp_dir.path();
    let mut snapshot = Snapshot::capture(root, &code_config()).await.unwrap();
    let tree_root = snapshot.root();

    for (position, file) in snapshot.files().to_vec().iter().enumerate() {
        let (index, leaf, proof) = snapshot.prove(file).unwrap();
        assert_eq!(index, position as u64 + 1);
        assert_eq!(leaf, Hash::digest(fs::read(file).unwrap()));
        assert_eq!(proof.height, 3);
        assert!(proof.verify(&tree_root, &leaf));
    }

    let (index, _, _) = snapshot.prove(Path::new("src/util.h")).unwrap();
    assert_eq!(index, 4);
}

#[tokio::test]
async fn test_relative_root_accepts_absolute_paths() {
    let temp_dir = tempfile::Builder::new().tempdir_in(".").unwrap();
    let root = temp_dir.path();
    assert!(root.is_relative());
    populate(root);

    let mut snapshot = Snapshot::capture(root, &code_config()).await.unwrap();
    let tree_root = snapshot.root();
    let absolute = fs::canonicalize(root).unwrap().join("src/main.c");

    assert_eq!(snapshot.leaf_index(Path::new("src/main.c")), Some(2));
    assert_eq!(snapshot.leaf_index(&root.join("src/main.c")), Some(2));
    assert_eq!(snapshot.leaf_index(&absolute), Some(2));
    assert_eq!(snapshot.leaf_index(Path::new("/elsewhere/src/main.c")), None);

    let (index, leaf, proof) = snapshot.prove(&absolute).unwrap();
    assert_eq!(index, 2);
    assert!(proof.verify(&tree_root, &leaf));

    write(root, "src/main.c", "int main() { return 1; }\n");
    let refreshed = snapshot.refresh_file(&absolute).await.unwrap();
    let mut fresh = Snapshot::capture(root, &code_config()).await.unwrap();
    assert_eq!(refreshed, fresh.root());
}

#[tokio::test]
async fn test_line_mode_changes_the_root() {
    let temp_dir = source_tree();
    let raw_config = code_config();
    let lines_config = Config {
        content_mode: ContentMode::Lines,
        ..code_config()
    };
    let mut raw = Snapshot::capture(temp_dir.path(), &raw_config).await.unwrap();
    let mut lines = Snapshot::capture(temp_dir.path(), &lines_config).await.unwrap();
    assert_ne!(raw.root(), lines.root());

    let file = lines.files()[0].clone();
    let (_, leaf, _) = lines.prove(&file).unwrap();
    let mut expected = fs::read(&file).unwrap();
    expected.push(b'\n');
    assert_eq!(leaf, Hash::digest(expected));
}

#[tokio::test]
async fn test_shared_handle_after_capture() {
    let temp_dir = source_tree();
    let mut snapshot = Snapshot::capture(temp_dir.path(), &code_config()).await.unwrap();
    let root = snapshot.root();
    let shared = snapshot.into_shared();
    assert_eq!(shared.root().unwrap(), root);

    let updated = shared.update(2, Hash::digest(b"patched")).unwrap();
    assert_ne!(updated, root);
    let (root, leaf, proof) = shared.prove(2).unwrap();
    assert!(proof.verify(&root, &leaf));
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("gone");
    assert!(Snapshot::capture(&missing, &Config::default()).await.is_err());
}
