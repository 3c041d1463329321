//! Fixtures shared by the workspace's test suites.

use std::path::Path;

pub use tempfile::TempDir;

/// SQLite URL for a fresh database file inside `dir`.
pub fn sqlite_url(dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", dir.join("db.sqlite").to_string_lossy())
}

pub fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("catalog-test-")
        .tempdir()
        .unwrap_or_else(|err| panic!("failed to create temp dir: {err}"))
}

pub mod images {
    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_SIGNATURE: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

    /// Bytes that sniff as PNG; not a decodable image.
    pub fn png() -> Vec<u8> {
        padded(&PNG_SIGNATURE, 64)
    }

    pub fn jpeg() -> Vec<u8> {
        padded(&JPEG_SIGNATURE, 64)
    }

    pub fn gif() -> Vec<u8> {
        padded(b"GIF89a", 64)
    }

    /// A JPEG-signed payload of exactly `kb` kibibytes.
    pub fn jpeg_of_kb(kb: usize) -> Vec<u8> {
        padded(&JPEG_SIGNATURE, kb * 1024)
    }

    pub fn pdf() -> Vec<u8> {
        padded(b"%PDF-1.7\n", 64)
    }

    fn padded(signature: &[u8], len: usize) -> Vec<u8> {
        let mut bytes = signature.to_vec();
        bytes.resize(len.max(signature.len()), 0);
        bytes
    }
}

pub mod multipart {
    /// Builds `multipart/form-data` request bodies.
    pub struct MultipartBody {
        boundary: String,
        body: Vec<u8>,
    }

    impl Default for MultipartBody {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MultipartBody {
        pub fn new() -> Self {
            Self {
                boundary: format!("----catalog-{}", uuid::Uuid::new_v4().simple()),
                body: Vec::new(),
            }
        }

        pub fn text(mut self, name: &str, value: &str) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    self.boundary, name, value
                )
                .as_bytes(),
            );
            self
        }

        pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    self.boundary, name, file_name, content_type
                )
                .as_bytes(),
            );
            self.body.extend_from_slice(bytes);
            self.body.extend_from_slice(b"\r\n");
            self
        }

        pub fn content_type(&self) -> String {
            format!("multipart/form-data; boundary={}", self.boundary)
        }

        pub fn finish(mut self) -> (String, Vec<u8>) {
            self.body
                .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
            (self.content_type(), self.body)
        }
    }
}
