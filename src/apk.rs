use crate::binary_xml::BinaryXml;
use crate::err::{ApkError, ApkResult};

use log::warn;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use zip::result::ZipError;
use zip::ZipArchive;

const ANDROID_MANIFEST: &str = "AndroidManifest.xml";

const MANIFEST_TAG_APPLICATION: &str = "application";

const MANIFEST_ATTRIBUTE_DEBUGGABLE: &str = "debuggable";

const APPLICATION_PATH: &[&str] = &["manifest", MANIFEST_TAG_APPLICATION];

/// High-level questions over an APK on disk.
///
/// Each operation reopens the archive; the struct itself holds nothing but
/// the path, so it is cheap to construct and keeps no file handles alive.
pub struct Apk {
    path: PathBuf,
}

impl Apk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Apk { path: path.into() }
    }

    fn archive(&self) -> ApkResult<ZipArchive<File>> {
        Ok(ZipArchive::new(File::open(&self.path)?)?)
    }

    fn missing_manifest(&self) -> ApkError {
        ApkError::MissingAndroidManifest {
            path: self.path.display().to_string(),
        }
    }

    /// Entry names in the archive, in archive order.
    pub fn files(&self) -> ApkResult<Vec<String>> {
        Ok(self.archive()?.file_names().map(str::to_owned).collect())
    }

    /// Raw bytes of one archive entry.
    pub fn file_content(&self, name: &str) -> ApkResult<Vec<u8>> {
        let mut archive = self.archive()?;
        let mut entry = archive.by_name(name)?;

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// The compiled `AndroidManifest.xml`, parsed.
    pub fn manifest(&self) -> ApkResult<BinaryXml> {
        let mut archive = self.archive()?;
        let mut entry = match archive.by_name(ANDROID_MANIFEST) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                warn!("unable to find manifest in [{}]", self.path.display());
                return Err(self.missing_manifest());
            }
            Err(err) => return Err(err.into()),
        };

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        if contents.is_empty() {
            warn!("manifest in [{}] is empty", self.path.display());
            return Err(self.missing_manifest());
        }

        Ok(BinaryXml::new(contents))
    }

    /// True when a manifest is present and declares an application element.
    pub fn is_valid(&self) -> bool {
        match self.manifest() {
            Ok(manifest) => manifest.has_element(MANIFEST_TAG_APPLICATION),
            Err(err) => {
                warn!("apk is not valid: {}", err);
                false
            }
        }
    }

    pub fn is_debuggable(&self) -> ApkResult<bool> {
        let manifest = self.manifest()?;
        if !manifest.has_element(MANIFEST_TAG_APPLICATION) {
            return Err(ApkError::MalformedAndroidManifest {
                path: self.path.display().to_string(),
            });
        }

        let attributes = manifest.element_attributes(APPLICATION_PATH);
        Ok(attributes
            .get(MANIFEST_ATTRIBUTE_DEBUGGABLE)
            .map(|value| value == "true")
            .unwrap_or(false))
    }

    /// Rewrites `debuggable` to `"true"` in place and returns the patched
    /// manifest bytes. The caller repackages the archive.
    pub fn make_debuggable(&self) -> ApkResult<Vec<u8>> {
        let mut manifest = self.manifest()?;
        if !manifest.has_element(MANIFEST_TAG_APPLICATION) {
            return Err(ApkError::MalformedAndroidManifest {
                path: self.path.display().to_string(),
            });
        }

        manifest.set_element_attribute(APPLICATION_PATH, MANIFEST_ATTRIBUTE_DEBUGGABLE, "true")?;
        Ok(manifest.into_bytes())
    }

    /// The manifest as indented textual XML.
    pub fn android_manifest(&self) -> ApkResult<String> {
        Ok(self.manifest()?.to_text_xml())
    }

    pub fn package_name(&self) -> ApkResult<String> {
        self.manifest_attribute("package")
    }

    pub fn version_name(&self) -> ApkResult<String> {
        self.manifest_attribute("versionName")
    }

    pub fn version_code(&self) -> ApkResult<String> {
        self.manifest_attribute("versionCode")
    }

    fn manifest_attribute(&self, name: &str) -> ApkResult<String> {
        let attributes = self.manifest()?.element_attributes(&["manifest"]);
        Ok(attributes.get(name).cloned().unwrap_or_default())
    }

    /// Summary map in the shape the query front ends expect.
    pub fn properties(&self) -> ApkResult<BTreeMap<String, String>> {
        let is_valid = self.is_valid();

        let mut properties = BTreeMap::new();
        properties.insert("valid".to_owned(), is_valid.to_string());

        if is_valid {
            properties.insert("debuggable".to_owned(), self.is_debuggable()?.to_string());
            properties.insert("manifest".to_owned(), self.android_manifest()?);
            properties.insert("packageName".to_owned(), self.package_name()?);
            properties.insert("versionCode".to_owned(), self.version_code()?);
            properties.insert("versionName".to_owned(), self.version_name()?);
        }

        Ok(properties)
    }
}
