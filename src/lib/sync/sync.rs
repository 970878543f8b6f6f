use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

use super::types::{FileSync, Removal, SyncError, SyncResult};
use crate::lib::{
    config::{config::is_truthy, types::Config},
    template::types::{Attributes, Template},
};

impl FileSync {
    pub fn new(config: &Config) -> Self {
        FileSync {
            label: config.label.clone(),
            filename_template: Template::parse(&config.filename_format),
            end_with_newline: config.end_with_newline,
        }
    }

    fn filename_key(&self) -> String {
        format!("{}.filename", self.label)
    }

    fn newline_key(&self) -> String {
        format!("{}.end_with_newline", self.label)
    }

    /// `<label>.filename` wins when set; otherwise the filename template.
    pub fn resolve_filename(&self, attrs: &Attributes) -> PathBuf {
        match attrs.get(&self.filename_key()).filter(|name| !name.is_empty()) {
            Some(name) => PathBuf::from(name),
            None => PathBuf::from(self.filename_template.substitute(attrs)),
        }
    }

    fn wants_newline(&self, attrs: &Attributes) -> bool {
        match attrs.get(&self.newline_key()).filter(|value| !value.is_empty()) {
            Some(value) => is_truthy(value),
            None => self.end_with_newline,
        }
    }

    /// Writes the label payload to `path` (or the resolved filename),
    /// creating parent directories and truncating any previous content.
    pub async fn write(&self, attrs: &Attributes, path: Option<&Path>) -> SyncResult<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.resolve_filename(attrs),
        };
        let payload = attrs
            .get(&self.label)
            .ok_or_else(|| SyncError::MissingPayload {
                label: self.label.clone(),
            })?;

        let io_err = |source| SyncError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut file = fs::File::create(&path).await.map_err(io_err)?;
        file.write_all(payload.as_bytes()).await.map_err(io_err)?;
        if self.wants_newline(attrs) {
            file.write_all(b"\n").await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;

        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Deletes the file for `attrs`, returning the path it resolved to.
    /// Not-found is reported as [`Removal::AlreadyAbsent`].
    pub async fn remove(&self, attrs: &Attributes) -> SyncResult<(PathBuf, Removal)> {
        let path = self.resolve_filename(attrs);
        let removal = self.remove_path(&path).await?;
        Ok((path, removal))
    }

    pub async fn remove_path(&self, path: &Path) -> SyncResult<Removal> {
        match fs::remove_file(path).await {
            Ok(()) => {
                info!("Removed {}", path.display());
                Ok(Removal::Deleted)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} already absent", path.display());
                Ok(Removal::AlreadyAbsent)
            }
            Err(source) => Err(SyncError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const LABEL: &str = "l2f";

    fn engine(dir: &TempDir, format: &str) -> FileSync {
        FileSync::new(&Config {
            label: LABEL.to_string(),
            filename_format: format!("{}/{}", dir.path().display(), format),
            container_to_restart: None,
            end_with_newline: true,
            restart_debounce: Duration::from_secs(3),
        })
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_filename_uses_template() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");

        let path = sync.resolve_filename(&attrs(&[("name", "web")]));

        assert_eq!(path, dir.path().join("web.conf"));
    }

    #[test]
    fn test_resolve_filename_prefers_label_override() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");

        let path = sync.resolve_filename(&attrs(&[
            ("name", "web"),
            ("l2f.filename", "/srv/custom.yml"),
        ]));
        assert_eq!(path, PathBuf::from("/srv/custom.yml"));

        let path = sync.resolve_filename(&attrs(&[("name", "web"), ("l2f.filename", "")]));
        assert_eq!(path, dir.path().join("web.conf"));
    }

    #[tokio::test]
    async fn test_write_appends_newline_by_default() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");

        let path = sync
            .write(&attrs(&[("name", "web"), ("l2f", "routes: 80")]), None)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("web.conf"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "routes: 80\n");
    }

    #[tokio::test]
    async fn test_newline_label_override() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");

        let path = sync
            .write(
                &attrs(&[
                    ("name", "web"),
                    ("l2f", "routes: 80"),
                    ("l2f.end_with_newline", "No"),
                ]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "routes: 80");

        let mut quiet = engine(&dir, "{name}.conf");
        quiet.end_with_newline = false;
        let path = quiet
            .write(
                &attrs(&[
                    ("name", "api"),
                    ("l2f", "x"),
                    ("l2f.end_with_newline", "ON"),
                ]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs_and_truncates() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{group:misc}/{name}.conf");

        let first = sync
            .write(&attrs(&[("name", "web"), ("l2f", "a much longer payload")]), None)
            .await
            .unwrap();
        let second = sync
            .write(&attrs(&[("name", "web"), ("l2f", "short")]), None)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("misc").join("web.conf"));
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "short\n");
    }

    #[tokio::test]
    async fn test_write_to_explicit_path() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");
        let target = dir.path().join("explicit.txt");

        let path = sync
            .write(&attrs(&[("name", "web"), ("l2f", "p")]), Some(&target))
            .await
            .unwrap();

        assert_eq!(path, target);
        assert!(!dir.path().join("web.conf").exists());
    }

    #[tokio::test]
    async fn test_write_without_payload_fails() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");

        let err = sync.write(&attrs(&[("name", "web")]), None).await.unwrap_err();

        assert!(matches!(err, SyncError::MissingPayload { .. }));
        assert!(!dir.path().join("web.conf").exists());
    }

    #[tokio::test]
    async fn test_write_io_error_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let sync = engine(&dir, "blocker/{name}.conf");

        let err = sync
            .write(&attrs(&[("name", "web"), ("l2f", "p")]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");
        let web = attrs(&[("name", "web"), ("l2f", "p")]);
        let path = sync.write(&web, None).await.unwrap();

        assert_eq!(
            sync.remove(&web).await.unwrap(),
            (path.clone(), Removal::Deleted)
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_is_silent() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}.conf");

        let (_, removal) = sync.remove(&attrs(&[("name", "ghost")])).await.unwrap();

        assert_eq!(removal, Removal::AlreadyAbsent);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remove_other_errors_propagate() {
        let dir = TempDir::new().unwrap();
        let sync = engine(&dir, "{name}");
        std::fs::create_dir(dir.path().join("web")).unwrap();

        // Removing a directory with remove_file is not a not-found condition.
        let err = sync.remove(&attrs(&[("name", "web")])).await.unwrap_err();

        assert!(matches!(err, SyncError::Io { .. }));
    }
}
