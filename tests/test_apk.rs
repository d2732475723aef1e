use fixtures::*;

use axml::err::ApkError;
use axml::Apk;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::FileOptions;

fn manifest_bytes(debuggable_value: &str) -> Vec<u8> {
    let mut fixture = AxmlFixture::new_utf8();
    fixture.start_namespace();
    fixture.start_element(
        "manifest",
        &[
            FixtureAttr::string("package", "com.example.sample"),
            FixtureAttr::string("versionName", "1.2.3"),
            FixtureAttr::int_dec("versionCode", 21),
        ],
    );
    fixture.start_element(
        "application",
        &[FixtureAttr::string("debuggable", debuggable_value)],
    );
    fixture.end_element("application");
    fixture.end_element("manifest");
    fixture.end_namespace();
    fixture.build()
}

/// Writes a minimal APK into a fresh temp dir; the returned guard deletes
/// it on drop.
fn write_apk(manifest: Option<&[u8]>) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("sample.apk");

    let file = std::fs::File::create(&path).expect("create test apk");
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default();

    if let Some(bytes) = manifest {
        writer
            .start_file("AndroidManifest.xml", options)
            .expect("start manifest entry");
        writer.write_all(bytes).expect("write manifest entry");
    }
    writer
        .start_file("classes.dex", options)
        .expect("start dex entry");
    writer.write_all(b"dex\n035").expect("write dex entry");
    writer.finish().expect("finish test apk");

    (dir, path)
}

#[test]
fn lists_archive_files() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("false")));

    let files = Apk::new(&path).files().unwrap();
    assert!(files.contains(&"AndroidManifest.xml".to_owned()));
    assert!(files.contains(&"classes.dex".to_owned()));
}

#[test]
fn reads_file_content() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("false")));

    let content = Apk::new(&path).file_content("classes.dex").unwrap();
    assert_eq!(content, b"dex\n035");
}

#[test]
fn validity_requires_an_application_element() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("false")));
    assert!(Apk::new(&path).is_valid());

    let (_dir, path) = write_apk(None);
    assert!(!Apk::new(&path).is_valid());
}

#[test]
fn missing_manifest_is_reported() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(None);

    let err = Apk::new(&path).manifest().unwrap_err();
    assert!(matches!(err, ApkError::MissingAndroidManifest { .. }));
}

#[test]
fn reads_manifest_identity_attributes() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("false")));
    let apk = Apk::new(&path);

    assert_eq!(apk.package_name().unwrap(), "com.example.sample");
    assert_eq!(apk.version_name().unwrap(), "1.2.3");
    assert_eq!(apk.version_code().unwrap(), "21");
}

#[test]
fn debuggable_reflects_the_manifest_attribute() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("false")));
    assert!(!Apk::new(&path).is_debuggable().unwrap());

    let (_dir, path) = write_apk(Some(&manifest_bytes("true")));
    assert!(Apk::new(&path).is_debuggable().unwrap());
}

#[test]
fn make_debuggable_is_length_preserving() {
    ensure_env_logger_initialized();
    // The slot holds "false" (5 bytes); "true" cannot replace it in place.
    let (_dir, path) = write_apk(Some(&manifest_bytes("false")));
    let err = Apk::new(&path).make_debuggable().unwrap_err();
    assert!(matches!(err, ApkError::Axml { .. }));

    // A slot already holding "true" is rewritten to itself.
    let manifest = manifest_bytes("true");
    let (_dir, path) = write_apk(Some(&manifest));
    let patched = Apk::new(&path).make_debuggable().unwrap();
    assert_eq!(patched, manifest);
}

#[test]
fn properties_summarize_the_manifest() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("true")));

    let properties = Apk::new(&path).properties().unwrap();
    assert_eq!(properties.get("valid").map(String::as_str), Some("true"));
    assert_eq!(properties.get("debuggable").map(String::as_str), Some("true"));
    assert_eq!(
        properties.get("packageName").map(String::as_str),
        Some("com.example.sample")
    );
    assert_eq!(properties.get("versionCode").map(String::as_str), Some("21"));
    assert_eq!(properties.get("versionName").map(String::as_str), Some("1.2.3"));
    assert!(properties
        .get("manifest")
        .map(|xml| xml.contains("<application"))
        .unwrap_or(false));
}

#[test]
fn android_manifest_renders_text_xml() {
    ensure_env_logger_initialized();
    let (_dir, path) = write_apk(Some(&manifest_bytes("true")));

    let xml = Apk::new(&path).android_manifest().unwrap();
    assert!(xml.contains("<manifest"), "got: {xml}");
    assert!(xml.contains("package=\"com.example.sample\""), "got: {xml}");
}
