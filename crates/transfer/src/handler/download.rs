use super::{Handler, check_arguments, local_failure};
use crate::destination::Destination;
use crate::error::{Error, Result};
use crate::fixup::fixup;
use crate::response::Response;
use library::{Library, LibraryRoot};
use std::collections::HashMap;

/// Where downloaded blobs go.
#[derive(Clone, Copy)]
pub(super) enum Target<'r> {
    /// Mirror under the root whose recorded URL matches the source host
    Root(&'r LibraryRoot),
    /// One known mirror
    Library(&'r Library),
}

impl Handler<'_> {
    /// Download every `<SRC>` into the local library.
    ///
    /// Each source lands in the mirror whose recorded URL is the source's
    /// host, keyed by the source entity name.
    pub fn download(&self, args: &[String]) -> Result<Response> {
        let root = self.flags.library_root()?;
        check_arguments(
            format!("download-{}", self.kind),
            args,
            "1 or more",
            !args.is_empty(),
        )?;

        // Resolve everything before the first fetch so bad input fails early
        let sources = self.resolver().resolve_all(args)?;

        Ok(self.download_sources(&sources, Target::Root(&root)))
    }

    pub(super) fn download_sources(&self, sources: &[Destination], target: Target<'_>) -> Response {
        let mut response = Response::new();
        let mut found: HashMap<String, Library> = HashMap::new();

        for source in sources {
            let library = match target {
                Target::Library(library) => library.clone(),
                Target::Root(root) => match lookup(root, source.host(), &mut found) {
                    Ok(library) => library,
                    Err(failure) => {
                        response.merge(failure);
                        continue;
                    }
                },
            };

            response.merge(self.download_one(source, &library));
        }

        response
    }

    fn download_one(&self, source: &Destination, library: &Library) -> Response {
        if !source.has_entity() {
            return local_failure(Error::UnresolvedAddress(source.host().to_string()));
        }

        let mut response = Response::new();
        response.out(format!("Fetching {source}"));
        log::info!("Fetching {}", source);

        let fetched = self.fetch(source);
        if !fetched.succeeded() {
            return response.merged(fetched);
        }

        let local = Destination::new(library.url(), source.entity());
        let payload = fixup(fetched.stdout(), self.kind, source, &local);

        if self.flags.dry_run {
            response.out(format!(
                "Would save {} to library '{}' (dry run)",
                source.entity(),
                library.name()
            ));
            return response;
        }

        match library.write(self.kind.collection(), source.entity(), &payload) {
            Ok(path) => {
                response.out(format!("Saved {}", path.display()));
                response
            }
            Err(e) => response.merged(local_failure(e)),
        }
    }
}

fn lookup(
    root: &LibraryRoot,
    host: &str,
    found: &mut HashMap<String, Library>,
) -> std::result::Result<Library, Response> {
    if let Some(library) = found.get(host) {
        return Ok(library.clone());
    }

    match root.find_by_url(host) {
        Ok(Some(library)) => {
            found.insert(host.to_string(), library.clone());
            Ok(library)
        }
        Ok(None) => Err(local_failure(library::Error::UnknownUrl {
            root: root.path().to_path_buf(),
            url: host.to_string(),
        })),
        Err(e) => Err(local_failure(e)),
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::mock::MockConnector;
    use crate::error::Error;
    use crate::handler::testing::{args, mirror};
    use crate::handler::{Handler, TransferFlags};
    use crate::kind::Kind;
    use crate::pool::ExecutorPool;
    use crate::response::LOCAL_FAILURE_CODE;
    use std::fs;
    use tempfile::TempDir;

    const CI: &str = "https://ci.example/";

    fn flags(root: &TempDir) -> TransferFlags {
        TransferFlags {
            local_library: Some(root.path().to_path_buf()),
            ..TransferFlags::default()
        }
    }

    #[test]
    fn test_download_without_library_makes_no_calls() {
        let mock = MockConnector::new();
        let pool = ExecutorPool::new(mock.clone());
        let flags = TransferFlags::default();

        let result = Handler::new(&pool, Kind::Job, &flags)
            .download(&args(&["https://ci.example/job/alpha"]));

        assert!(matches!(result, Err(Error::MissingLocalLibrary)));
        assert!(mock.connections().is_empty());
    }

    #[test]
    fn test_download_without_sources() {
        let temp = TempDir::new().unwrap();
        let pool = ExecutorPool::new(MockConnector::new());
        let flags = flags(&temp);

        let result = Handler::new(&pool, Kind::Job, &flags).download(&[]);
        assert!(matches!(result, Err(Error::InsufficientArguments { .. })));
    }

    #[test]
    fn test_download_writes_into_matching_mirror() {
        let temp = TempDir::new().unwrap();
        let path = mirror(temp.path(), "ci", CI);
        mirror(temp.path(), "other", "https://other.example/");

        let mock = MockConnector::new();
        mock.respond_ok(CI, "get-job", "alpha", "<project>https://ci.example/job/alpha</project>");
        let pool = ExecutorPool::new(mock);
        let flags = flags(&temp);

        let response = Handler::new(&pool, Kind::Job, &flags)
            .download(&args(&["https://ci.example/view/all/job/alpha/"]))
            .unwrap();

        assert!(response.succeeded(), "{}", response.stderr());
        assert_eq!(
            fs::read_to_string(path.join("jobs").join("alpha")).unwrap(),
            "<project>https://ci.example/job/alpha</project>"
        );
    }

    #[test]
    fn test_download_continues_past_failures() {
        let temp = TempDir::new().unwrap();
        let path = mirror(temp.path(), "ci", CI);

        let mock = MockConnector::new();
        mock.respond_ok(CI, "get-job", "beta", "<project/>");
        let pool = ExecutorPool::new(mock.clone());
        let flags = flags(&temp);

        let response = Handler::new(&pool, Kind::Job, &flags)
            .download(&args(&[
                "https://ci.example/job/missing",
                "https://unknown.example/job/beta",
                "https://ci.example/job/beta",
            ]))
            .unwrap();

        // First failure wins: the missing job on the remote
        assert_eq!(response.return_code(), crate::backend::mock::NOT_FOUND_CODE);
        assert!(response.stderr().contains("records url https://unknown.example/"));
        assert!(path.join("jobs").join("beta").is_file());
        assert_eq!(mock.calls_to("get-job").len(), 2);
    }

    #[test]
    fn test_download_unknown_host_is_local_failure() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path(), "ci", CI);
        let mock = MockConnector::new();
        let pool = ExecutorPool::new(mock.clone());
        let flags = flags(&temp);

        let response = Handler::new(&pool, Kind::Job, &flags)
            .download(&args(&["https://elsewhere.example/job/x"]))
            .unwrap();

        assert_eq!(response.return_code(), LOCAL_FAILURE_CODE);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_download_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = mirror(temp.path(), "ci", CI);
        let mock = MockConnector::new();
        mock.respond_ok(CI, "get-node", "agent", "<slave/>");
        let pool = ExecutorPool::new(mock);
        let flags = TransferFlags {
            dry_run: true,
            ..flags(&temp)
        };

        let response = Handler::new(&pool, Kind::Node, &flags)
            .download(&args(&["https://ci.example/computer/agent/"]))
            .unwrap();

        assert!(response.succeeded());
        assert!(!path.join("nodes").exists());
    }
}
