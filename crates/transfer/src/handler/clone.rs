use super::{Handler, check_arguments, local_failure};
use crate::destination::Destination;
use crate::error::{Error, Result};
use crate::fixup::fixup;
use crate::response::Response;

impl Handler<'_> {
    /// Clone `<SRC>` to `<DST>`.
    ///
    /// Fetches the source configuration, rewrites source references to the
    /// destination, then tries `update` at the destination and falls back to
    /// `create` when the update reports failure. The fallback does not tell
    /// "missing" from "rejected"; both trigger a create attempt.
    pub fn clone_entity(&self, args: &[String]) -> Result<Response> {
        check_arguments(self.kind.name().to_string(), args, "exactly 2", args.len() == 2)?;

        let resolver = self.resolver();
        let source = resolver.resolve(&args[0])?;
        let mut destination = resolver.resolve(&args[1])?;

        if !destination.has_entity() && source.has_entity() {
            destination = Destination::new(destination.host(), source.entity());
        }
        for end in [&source, &destination] {
            if !end.has_entity() {
                return Ok(local_failure(Error::UnresolvedAddress(end.host().to_string())));
            }
        }

        let mut response = Response::new();
        response.out(format!("Fetching {source}"));
        log::info!("Fetching {}", source);

        let fetched = self.fetch(&source);
        if !fetched.succeeded() {
            return Ok(response.merged(fetched));
        }
        let payload = fixup(fetched.stdout(), self.kind, &source, &destination);

        if self.flags.dry_run {
            response.out(format!("Would update {destination} (dry run)"));
            return Ok(response);
        }

        response.out(format!("Updating {destination}"));
        log::info!("Updating {}", destination);
        let updated = self.pool.execute(
            &destination,
            &payload,
            self.kind.update_command(),
            destination.entity(),
        );
        if updated.succeeded() {
            return Ok(response.merged(updated));
        }

        log::debug!(
            "{} failed ({}), falling back to {}",
            self.kind.update_command(),
            updated.stderr().trim(),
            self.kind.create_command()
        );
        response.err(format!(
            "{} failed for {destination}, trying {}",
            self.kind.update_command(),
            self.kind.create_command()
        ));
        response.out(format!("Creating {destination}"));
        let created = self.pool.execute(
            &destination,
            &payload,
            self.kind.create_command(),
            destination.entity(),
        );

        Ok(response.merged(created))
    }
}
