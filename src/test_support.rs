//! Archive builders shared by the unit tests.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Cursor, Write};
use tar::{Builder, EntryType, Header};

pub enum TestEntry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8], u32),
    Symlink(&'a str, &'a str),
    /// Written byte-for-byte into the header, bypassing path validation.
    RawFile(&'a str, &'a [u8]),
}

fn append_entries<W: Write>(builder: &mut Builder<W>, entries: &[TestEntry<'_>]) {
    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            TestEntry::Dir(path) => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, path, io::empty()).unwrap();
            }
            TestEntry::File(path, data, mode) => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, path, *data).unwrap();
            }
            TestEntry::Symlink(path, target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(0o777);
                header.set_size(0);
                header.set_link_name(target).unwrap();
                builder.append_data(&mut header, path, io::empty()).unwrap();
            }
            TestEntry::RawFile(path, data) => {
                let name = &mut header.as_old_mut().name;
                name[..path.len()].copy_from_slice(path.as_bytes());
                header.set_entry_type(EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(data.len() as u64);
                header.set_cksum();
                builder.append(&header, *data).unwrap();
            }
        }
    }
}

pub fn tar_gz(entries: &[TestEntry<'_>]) -> Vec<u8> {
    let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append_entries(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn tar_xz(entries: &[TestEntry<'_>]) -> Vec<u8> {
    let mut builder = Builder::new(xz2::write::XzEncoder::new(Vec::new(), 6));
    append_entries(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap()
}

/// `(name, None)` adds a directory, `(name, Some(data))` a stored file.
pub fn zip_bytes(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        match data {
            None => writer.add_directory(*name, options).unwrap(),
            Some(data) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
    }
    writer.finish().unwrap().into_inner()
}

/// A Go-shaped distribution whose `go version` prints `version`.
pub fn go_distribution(version: &str) -> Vec<u8> {
    let script = format!(
        "#!/bin/sh\necho \"go version {} linux/amd64\"\n",
        version
    );
    tar_gz(&[
        TestEntry::Dir("go/"),
        TestEntry::Dir("go/bin/"),
        TestEntry::File("go/bin/go", script.as_bytes(), 0o755),
        TestEntry::File("go/VERSION", version.as_bytes(), 0o644),
    ])
}

/// A Zig-shaped distribution rooted at a versioned directory.
pub fn zig_distribution(version: &str) -> Vec<u8> {
    let root = format!("zig-linux-x86_64-{}", version);
    let script = format!("#!/bin/sh\necho \"{}\"\n", version);
    let exe = format!("{}/zig", root);
    let lib = format!("{}/lib/", root);
    let std = format!("{}/lib/std.zig", root);
    tar_xz(&[
        TestEntry::Dir(&format!("{}/", root)),
        TestEntry::File(&exe, script.as_bytes(), 0o755),
        TestEntry::Dir(&lib),
        TestEntry::File(&std, b"pub const x = 1;\n", 0o644),
    ])
}

pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}
