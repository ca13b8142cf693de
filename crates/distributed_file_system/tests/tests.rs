use std::{fs, path::PathBuf};

use wcbench_dfs::{
    dfs::{part_file_name, DfsError, LocalDfs, SUCCESS_MARKER},
    path::DfsPath,
    split::{compute_splits, SplitRecords},
};

fn dfs_with_file(name: &str, contents: &str) -> (tempfile::TempDir, LocalDfs) {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join(name.trim_start_matches('/'));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    let dfs = LocalDfs::new(root.path());
    (root, dfs)
}

#[test]
fn last_segment() {
    assert_eq!(
        DfsPath::new("/user/root/task2/input_wordcount_500MB").last_segment(),
        "input_wordcount_500MB"
    );
    assert_eq!(DfsPath::new("input_1GB").last_segment(), "input_1GB");
    assert_eq!(DfsPath::new("/user/root/task2/").last_segment(), "");
    assert_eq!(DfsPath::new("/data").join("part").as_str(), "/data/part");
    assert_eq!(DfsPath::new("/data/").join("part").as_str(), "/data/part");
}

#[test]
fn split_sizes() {
    let file = PathBuf::from("input");

    let splits = compute_splits(file.clone(), 0, 100, 0);
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].length, 0);

    // 105 bytes is within the slop of one split.
    let splits = compute_splits(file.clone(), 105, 100, 0);
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].length, 105);

    let splits = compute_splits(file.clone(), 250, 100, 3);
    assert_eq!(
        splits.iter().map(|s| (s.id, s.start, s.length)).collect::<Vec<_>>(),
        vec![(3, 0, 100), (4, 100, 100), (5, 200, 50)]
    );
}

#[test]
fn records_strip_terminators() {
    let records = SplitRecords::new(b"a b\r\n\nlast".to_vec());
    assert_eq!(
        records.records().collect::<Vec<_>>(),
        vec![&b"a b"[..], &b""[..], &b"last"[..]]
    );
    assert_eq!(records.len(), 3);
    assert_eq!(records.bytes(), 10);
}

#[test]
fn splits_cover_every_line_once() {
    let lines = (0..200).map(|i| format!("line {} {}", i, "x".repeat(i % 17))).collect::<Vec<_>>();
    let (_root, dfs) = dfs_with_file("/in/data.txt", &(lines.join("\n") + "\n"));

    for split_size in [1, 7, 64, 1000, 1 << 20] {
        let splits = dfs.splits(&[DfsPath::new("/in")], split_size).unwrap();
        let mut read = Vec::new();
        for split in splits.iter() {
            let records = dfs.read_records(split).unwrap();
            read.extend(records.records().map(|r| String::from_utf8(r.to_vec()).unwrap()));
        }
        assert_eq!(read, lines, "split size {}", split_size);
    }
}

#[test]
fn hidden_files_are_not_input() {
    let (root, dfs) = dfs_with_file("/in/a.txt", "a\n");
    fs::write(root.path().join("in/_SUCCESS"), "").unwrap();
    fs::write(root.path().join("in/.a.txt.crc"), "").unwrap();
    fs::write(root.path().join("in/b.txt"), "b\n").unwrap();

    let files = dfs.list_input_files(&DfsPath::new("/in")).unwrap();
    assert_eq!(files, vec![root.path().join("in/a.txt"), root.path().join("in/b.txt")]);

    assert!(matches!(
        dfs.list_input_files(&DfsPath::new("/missing")),
        Err(DfsError::NotFound(_))
    ));
}

#[test]
fn output_commit() {
    let (root, dfs) = dfs_with_file("/in/a.txt", "a\n");
    let output = DfsPath::new("/out");

    dfs.create_output_dir(&output).unwrap();
    assert!(matches!(dfs.create_output_dir(&output), Err(DfsError::AlreadyExists(_))));

    let written = dfs
        .write_part(&output, 1, vec![(b"cat".to_vec(), 2u64), (b"the".to_vec(), 3u64)])
        .unwrap();
    assert_eq!(written, 2);
    dfs.write_part(&output, 0, Vec::<(Vec<u8>, u64)>::new()).unwrap();
    dfs.mark_success(&output).unwrap();

    assert_eq!(
        fs::read_to_string(root.path().join("out").join(part_file_name(1))).unwrap(),
        "cat\t2\nthe\t3\n"
    );
    assert!(root.path().join("out/part-r-00000").exists());
    assert!(root.path().join("out").join(SUCCESS_MARKER).exists());
    assert_eq!(dfs.read_parts(&output).unwrap(), vec![b"cat\t2".to_vec(), b"the\t3".to_vec()]);

    assert!(dfs.remove(&output).unwrap());
    assert!(!dfs.remove(&output).unwrap());
    assert!(!dfs.exists(&output));
}

#[test]
fn relative_paths_use_working_dir() {
    let (root, dfs) = dfs_with_file("/home/pr/in/a.txt", "a\n");
    assert_eq!(dfs.resolve(&DfsPath::new("pr/in")), root.path().join("pr/in"));
    assert!(!dfs.exists(&DfsPath::new("pr/in")));

    let dfs = dfs.with_working_dir(root.path().join("home"));
    assert_eq!(dfs.resolve(&DfsPath::new("/home/pr")), root.path().join("home/pr"));
    assert_eq!(dfs.resolve(&DfsPath::new("pr/in")), root.path().join("home/pr/in"));
    assert_eq!(
        dfs.list_input_files(&DfsPath::new("pr/in")).unwrap(),
        vec![root.path().join("home/pr/in/a.txt")]
    );
}
