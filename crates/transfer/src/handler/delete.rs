use super::{Handler, check_arguments, local_failure};
use crate::error::{Error, Result};
use crate::response::Response;

impl Handler<'_> {
    /// Delete every addressed entity on its remote.
    pub fn delete(&self, args: &[String]) -> Result<Response> {
        check_arguments(
            self.kind.delete_command().to_string(),
            args,
            "1 or more",
            !args.is_empty(),
        )?;
        let targets = self.resolver().resolve_all(args)?;

        let mut response = Response::new();
        for target in &targets {
            if !target.has_entity() {
                response.merge(local_failure(Error::UnresolvedAddress(
                    target.host().to_string(),
                )));
                continue;
            }

            if self.flags.dry_run {
                response.out(format!("Would delete {target} (dry run)"));
                continue;
            }

            response.out(format!("Deleting {target}"));
            log::info!("Deleting {}", target);
            response.merge(self.pool.execute(
                target,
                "",
                self.kind.delete_command(),
                target.entity(),
            ));
        }

        Ok(response)
    }
}
