use super::download::Target;
use super::{Handler, TransferFlags, check_arguments, local_failure};
use crate::error::Result;
use crate::kind::Kind;
use crate::pool::ExecutorPool;
use crate::response::Response;
use library::{Collection, Library, LibraryRoot};

/// Downloads that refresh one local library.
#[derive(Debug, Clone)]
pub struct PullPlan {
    pub library: Library,
    /// Job URLs on the library's remote, one per mirrored job
    pub sources: Vec<String>,
    /// Caller flags with `force` set
    pub flags: TransferFlags,
}

/// Plan a refresh of every job mirrored in library `name`.
pub fn plan_pull(root: &LibraryRoot, name: &str, flags: &TransferFlags) -> library::Result<PullPlan> {
    let library = root.open(name)?;
    let sources = library
        .list(Collection::Jobs)?
        .into_iter()
        .map(|job| format!("{}{}/{}", library.url(), Kind::Job.url_segment(), job))
        .collect();

    Ok(PullPlan {
        library,
        sources,
        flags: TransferFlags {
            force: true,
            ..flags.clone()
        },
    })
}

/// Refresh every job of the named local library from its remote.
pub fn pull(pool: &ExecutorPool, flags: &TransferFlags, args: &[String]) -> Result<Response> {
    let root = flags.library_root()?;
    check_arguments("pull".to_string(), args, "exactly 1", args.len() == 1)?;

    let plan = match plan_pull(&root, &args[0], flags) {
        Ok(plan) => plan,
        Err(e) => return Ok(local_failure(e)),
    };
    log::info!(
        "Pulling {} jobs into '{}' from {}",
        plan.sources.len(),
        plan.library.name(),
        plan.library.url()
    );

    let handler = Handler::new(pool, Kind::Job, &plan.flags);
    let sources = handler.resolver().resolve_all(&plan.sources)?;
    Ok(handler.download_sources(&sources, Target::Library(&plan.library)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockConnector;
    use crate::error::Error;
    use crate::handler::testing::{args, mirror};
    use crate::response::LOCAL_FAILURE_CODE;
    use std::fs;
    use tempfile::TempDir;

    const CI: &str = "https://ci.example/";

    fn setup() -> (TempDir, std::path::PathBuf, TransferFlags) {
        let temp = TempDir::new().unwrap();
        let path = mirror(temp.path(), "ci", CI);
        fs::write(path.join("jobs").join("alpha"), "old alpha").unwrap();
        fs::write(path.join("jobs").join("beta"), "old beta").unwrap();
        let flags = TransferFlags {
            local_library: Some(temp.path().to_path_buf()),
            ..TransferFlags::default()
        };
        (temp, path, flags)
    }

    #[test]
    fn test_plan_lists_every_job_with_force() {
        let (temp, _path, flags) = setup();
        let plan = plan_pull(&LibraryRoot::new(temp.path()), "ci", &flags).unwrap();

        assert_eq!(
            plan.sources,
            vec![
                "https://ci.example/job/alpha".to_string(),
                "https://ci.example/job/beta".to_string()
            ]
        );
        assert!(plan.flags.force);
        assert_eq!(plan.flags.local_library, flags.local_library);
    }

    #[test]
    fn test_pull_refreshes_library() {
        let (_temp, path, flags) = setup();
        let mock = MockConnector::new();
        mock.respond_ok(CI, "get-job", "alpha", "new alpha");
        mock.respond_ok(CI, "get-job", "beta", "new beta");
        let pool = ExecutorPool::new(mock.clone());

        let response = pull(&pool, &flags, &args(&["ci"])).unwrap();

        assert!(response.succeeded(), "{}", response.stderr());
        let gets = mock.calls_to("get-job");
        assert_eq!(gets.len(), 2);
        assert!(gets.iter().all(|c| c.host == CI));
        assert_eq!(gets[0].entity, "alpha");
        assert_eq!(gets[1].entity, "beta");
        assert_eq!(fs::read_to_string(path.join("jobs").join("beta")).unwrap(), "new beta");
    }

    #[test]
    fn test_pull_preflight() {
        let (_temp, _path, flags) = setup();
        let mock = MockConnector::new();
        let pool = ExecutorPool::new(mock.clone());

        assert!(matches!(
            pull(&pool, &TransferFlags::default(), &args(&["ci"])),
            Err(Error::MissingLocalLibrary)
        ));
        assert!(matches!(
            pull(&pool, &flags, &args(&["ci", "extra"])),
            Err(Error::InsufficientArguments { .. })
        ));

        let response = pull(&pool, &flags, &args(&["missing"])).unwrap();
        assert_eq!(response.return_code(), LOCAL_FAILURE_CODE);
        assert!(mock.connections().is_empty());
    }
}
