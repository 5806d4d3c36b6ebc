use std::io::{self, Cursor, Read};

/// Container format of a source distribution, chosen from the URL's filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
}

impl ArchiveFormat {
    /// Classify a source URL by its filename suffix. Anything that is not a
    /// gzip/bzip2 tarball or a zip yields `None`.
    pub fn from_url(url: &str) -> Option<Self> {
        let filename = url.rsplit('/').next().unwrap_or(url).to_ascii_lowercase();
        if filename.ends_with(".tar.gz") {
            Some(Self::TarGz)
        } else if filename.ends_with(".tar.bz2") {
            Some(Self::TarBz2)
        } else if filename.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Read the member file paths of an archive, directories excluded.
///
/// Tar containers are decoded and walked in a single forward pass — the byte
/// stream may be an HTTP response body that cannot seek. Zip needs random
/// access to its central directory, so the body is buffered in memory first.
pub fn file_listing(format: ArchiveFormat, reader: impl Read) -> io::Result<Vec<String>> {
    match format {
        ArchiveFormat::TarGz => tar_listing(flate2::read::GzDecoder::new(reader)),
        ArchiveFormat::TarBz2 => tar_listing(bzip2::read::BzDecoder::new(reader)),
        ArchiveFormat::Zip => zip_listing(reader),
    }
}

fn tar_listing(reader: impl Read) -> io::Result<Vec<String>> {
    let mut archive = tar::Archive::new(reader);
    let mut files = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        files.push(entry.path()?.to_string_lossy().into_owned());
    }
    Ok(files)
}

fn zip_listing(mut reader: impl Read) -> io::Result<Vec<String>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(buf)).map_err(io::Error::other)?;
    let mut files = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(io::Error::other)?;
        if entry.is_dir() {
            continue;
        }
        files.push(entry.name().to_owned());
    }
    Ok(files)
}

/// Whether the source tree carries a `pyproject.toml`, marking the module as
/// buildable through the isolated PEP 517 workflow.
pub fn supports_pep517(listing: &[String]) -> bool {
    listing
        .iter()
        .any(|path| path == "pyproject.toml" || path.ends_with("/pyproject.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tar_bytes(members: &[(&str, bool)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, is_dir) in members {
            let mut header = tar::Header::new_gnu();
            if *is_dir {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_cksum();
                builder.append_data(&mut header, *path, &[] as &[u8]).unwrap();
            } else {
                let data = b"content";
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_cksum();
                builder
                    .append_data(&mut header, *path, data.as_slice())
                    .unwrap();
            }
        }
        builder.into_inner().unwrap()
    }

    fn tar_gz_bytes(members: &[(&str, bool)]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&tar_bytes(members)).unwrap();
        encoder.finish().unwrap()
    }

    fn tar_bz2_bytes(members: &[(&str, bool)]) -> Vec<u8> {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        encoder.write_all(&tar_bytes(members)).unwrap();
        encoder.finish().unwrap()
    }

    fn zip_bytes(members: &[(&str, bool)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (path, is_dir) in members {
            if *is_dir {
                writer.add_directory(*path, options).unwrap();
            } else {
                writer.start_file(*path, options).unwrap();
                writer.write_all(b"content").unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn format_from_url_matches_suffixes() {
        assert_eq!(
            ArchiveFormat::from_url("https://files.example/pkg-1.0.tar.gz"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_url("https://files.example/pkg-1.0.TAR.BZ2"),
            Some(ArchiveFormat::TarBz2)
        );
        assert_eq!(
            ArchiveFormat::from_url("https://files.example/pkg-1.0.zip"),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::from_url("https://files.example/pkg-1.0-py3-none-any.whl"),
            None
        );
    }

    #[test]
    fn tar_gz_listing_excludes_directories() {
        let bytes = tar_gz_bytes(&[
            ("pkg-1.0/", true),
            ("pkg-1.0/setup.py", false),
            ("pkg-1.0/src/", true),
            ("pkg-1.0/src/mod.py", false),
        ]);
        let listing = file_listing(ArchiveFormat::TarGz, Cursor::new(bytes)).unwrap();
        assert_eq!(listing, vec!["pkg-1.0/setup.py", "pkg-1.0/src/mod.py"]);
    }

    #[test]
    fn tar_bz2_listing_decodes() {
        let bytes = tar_bz2_bytes(&[("pkg-1.0/README", false)]);
        let listing = file_listing(ArchiveFormat::TarBz2, Cursor::new(bytes)).unwrap();
        assert_eq!(listing, vec!["pkg-1.0/README"]);
    }

    #[test]
    fn zip_listing_excludes_directories() {
        let bytes = zip_bytes(&[
            ("pkg-1.0/", true),
            ("pkg-1.0/setup.py", false),
            ("pkg-1.0/LICENSE", false),
        ]);
        let listing = file_listing(ArchiveFormat::Zip, Cursor::new(bytes)).unwrap();
        assert_eq!(listing, vec!["pkg-1.0/setup.py", "pkg-1.0/LICENSE"]);
    }

    #[test]
    fn truncated_tar_stream_is_an_error() {
        let mut bytes = tar_gz_bytes(&[("pkg-1.0/setup.py", false)]);
        bytes.truncate(bytes.len() / 2);
        assert!(file_listing(ArchiveFormat::TarGz, Cursor::new(bytes)).is_err());
    }

    #[test]
    fn pep517_marker_found_at_any_depth() {
        let root = vec!["pyproject.toml".to_owned()];
        let nested = vec!["pkg-1.0/pyproject.toml".to_owned()];
        let absent = vec!["pkg-1.0/setup.py".to_owned(), "pkg-1.0/pyproject.rst".to_owned()];
        assert!(supports_pep517(&root));
        assert!(supports_pep517(&nested));
        assert!(!supports_pep517(&absent));
    }
}
