use derive_new::new;
use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use std::path::{Path, PathBuf};

/// A file to create in a test workspace
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

/// Write `spec`, creating missing parent directories
pub fn write_file(spec: FileSpec) {
    if let Some(dir) = spec.path.parent() {
        std::fs::create_dir_all(dir).expect("cannot create parent directories");
    }

    std::fs::write(&spec.path, spec.content).expect("cannot write test file");
}

/// `count` files of lorem ipsum directly below `dir`
pub fn write_generated_files(dir: &Path, count: usize) -> Vec<FileSpec> {
    (0..count)
        .map(|n| {
            // suffix keeps names unique when the faker repeats a word
            let name = format!("{}-{n}.txt", Word().fake::<String>());
            let content = Words(5..10).fake::<Vec<String>>().join(" ");

            let spec = FileSpec::new(dir.join(name), content);
            write_file(spec.clone());
            spec
        })
        .collect()
}
