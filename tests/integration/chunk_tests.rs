use std::fs;
use std::path::Path;

use tempfile::tempdir;
use tmplmerge::chunk::{list_loose_files, ChunkConfig, Chunker};

fn populate(dir: &Path, count: usize) {
    fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        fs::write(dir.join(format!("tpl-{i:05}.yaml")), i.to_string()).unwrap();
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_file())
        .count()
}

#[test]
fn test_250_files_in_chunks_of_100() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    populate(&corpus, 250);

    let stats = Chunker::new(ChunkConfig::new(100)).chunk(&corpus).unwrap();

    assert_eq!(stats.chunk_sizes, vec![100, 100, 50]);
    assert_eq!(stats.files_chunked, 250);
    assert_eq!(count_files(&corpus.join("chunk_1")), 100);
    assert_eq!(count_files(&corpus.join("chunk_2")), 100);
    assert_eq!(count_files(&corpus.join("chunk_3")), 50);
    assert_eq!(count_files(&corpus), 0);
}

#[test]
fn test_cardinality_is_preserved() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    populate(&corpus, 37);

    let stats = Chunker::new(ChunkConfig::new(8)).chunk(&corpus).unwrap();

    let total: usize = (1..=stats.chunk_count())
        .map(|n| count_files(&corpus.join(format!("chunk_{n}"))))
        .sum();
    assert_eq!(total, 37);
    assert_eq!(stats.chunk_sizes.last(), Some(&5));
}

#[test]
fn test_assignment_is_deterministic() {
    let tmp = tempdir().unwrap();
    let first = tmp.path().join("first");
    let second = tmp.path().join("second");
    populate(&first, 23);
    populate(&second, 23);

    let chunker = Chunker::new(ChunkConfig::new(5));
    chunker.chunk(&first).unwrap();
    chunker.chunk(&second).unwrap();

    for n in 1..=5 {
        let name = format!("chunk_{n}");
        assert_eq!(
            list_loose_files(&first.join(&name)).unwrap(),
            list_loose_files(&second.join(&name)).unwrap()
        );
    }
}

#[test]
fn test_first_chunk_holds_lowest_names() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    for name in ["b.yaml", "A.yaml", "a.yaml", "c.yaml"] {
        fs::write(corpus.join(name), name).unwrap();
    }

    Chunker::new(ChunkConfig::new(2)).chunk(&corpus).unwrap();

    // Byte order puts upper case first
    assert!(corpus.join("chunk_1/A.yaml").is_file());
    assert!(corpus.join("chunk_1/a.yaml").is_file());
    assert!(corpus.join("chunk_2/b.yaml").is_file());
    assert!(corpus.join("chunk_2/c.yaml").is_file());
}

#[test]
fn test_second_pass_only_moves_new_files() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    populate(&corpus, 3);

    let chunker = Chunker::new(ChunkConfig::new(10));
    chunker.chunk(&corpus).unwrap();

    fs::write(corpus.join("late.yaml"), "late").unwrap();
    let stats = chunker.chunk(&corpus).unwrap();

    assert_eq!(stats.files_listed, 1);
    assert_eq!(count_files(&corpus.join("chunk_1")), 4);
}

#[test]
fn test_custom_prefix() {
    let tmp = tempdir().unwrap();
    let corpus = tmp.path().join("corpus");
    populate(&corpus, 3);

    Chunker::new(ChunkConfig::new(2).with_prefix("batch-"))
        .chunk(&corpus)
        .unwrap();

    assert!(corpus.join("batch-1").is_dir());
    assert!(corpus.join("batch-2").is_dir());
    assert!(!corpus.join("chunk_1").exists());
}
