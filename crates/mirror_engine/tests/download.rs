use std::fs;

use mirror_engine::{
    ensure_output_dir, AtomicFileWriter, ClientSettings, DownloadError, ImageDownloader,
    ImageSaveOptions, ReqwestImageDownloader,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

fn save_options(dir: &TempDir) -> ImageSaveOptions {
    ImageSaveOptions {
        save_dir: dir.path().join("hello-world"),
        ..ImageSaveOptions::default()
    }
}

#[tokio::test]
async fn downloads_into_save_dir_with_derived_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/space/abc/photo"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES, "image/png"))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let downloader = ReqwestImageDownloader::new(&ClientSettings::default()).unwrap();

    let url = format!("{}/space/abc/photo?X-Amz-Signature=abc", server.uri());
    let saved = downloader.download(&url, &save_options(&temp)).await.expect("download ok");

    assert_eq!(saved.parent().unwrap(), temp.path().join("hello-world"));
    let name = saved.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("-photo.png"), "{name}");
    assert_eq!(fs::read(&saved).unwrap(), PNG_BYTES);
}

#[tokio::test]
async fn http_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expired.png"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let downloader = ReqwestImageDownloader::new(&ClientSettings::default()).unwrap();

    let url = format!("{}/expired.png", server.uri());
    let err = downloader.download(&url, &save_options(&temp)).await.unwrap_err();

    assert!(matches!(err, DownloadError::HttpStatus(403)));
    assert!(!temp.path().join("hello-world").exists());
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 64], "image/png"))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let downloader = ReqwestImageDownloader::new(&ClientSettings::default()).unwrap();
    let options = ImageSaveOptions {
        max_bytes: 16,
        ..save_options(&temp)
    };

    let url = format!("{}/big.png", server.uri());
    let err = downloader.download(&url, &options).await.unwrap_err();

    assert!(matches!(
        err,
        DownloadError::TooLarge {
            max_bytes: 16,
            actual: Some(64)
        }
    ));
}

#[tokio::test]
async fn requires_a_save_dir() {
    let downloader = ReqwestImageDownloader::new(&ClientSettings::default()).unwrap();
    let err = downloader
        .download("https://cdn.example.com/a.png", &ImageSaveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::NoSaveDir));
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("doc.md", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.md");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("doc.md", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.md", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("doc.md").exists());
}

/// Mode a plain `File::create` gets in `dir`: 0o666 minus the umask.
#[cfg(unix)]
fn plain_create_mode(dir: &std::path::Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    let reference = dir.join("reference");
    fs::File::create(&reference).unwrap();
    let mode = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;
    fs::remove_file(reference).unwrap();
    mode
}

#[cfg(unix)]
fn mode_of(path: &std::path::Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[cfg(unix)]
#[test]
fn written_files_follow_the_umask() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let path = writer.write("doc.md", b"x").unwrap();
    assert_eq!(mode_of(&path), plain_create_mode(temp.path()));
}

#[cfg(unix)]
#[tokio::test]
async fn downloaded_images_are_readable_by_other_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/space/abc/photo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES, "image/png"))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let downloader = ReqwestImageDownloader::new(&ClientSettings::default()).unwrap();

    let url = format!("{}/space/abc/photo.png", server.uri());
    let saved = downloader.download(&url, &save_options(&temp)).await.unwrap();

    assert_eq!(mode_of(&saved), plain_create_mode(saved.parent().unwrap()));
}
