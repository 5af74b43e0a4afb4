use super::{Handler, check_arguments, local_failure};
use crate::destination::LIBRARY_SEPARATOR;
use crate::error::Result;
use crate::response::Response;

impl Handler<'_> {
    /// Push entities from a local library to their remote.
    ///
    /// `args[0]` is the library directory relative to the local-library root;
    /// the rest are entity names resolved against the library's recorded URL.
    pub fn update(&self, args: &[String]) -> Result<Response> {
        let root = self.flags.library_root()?;
        check_arguments(
            format!("update-{}", self.kind),
            args,
            "2 or more",
            args.len() >= 2,
        )?;

        let library = match root.open(&args[0]) {
            Ok(library) => library,
            Err(e) => return Ok(local_failure(e)),
        };

        let addresses: Vec<String> = args[1..]
            .iter()
            .map(|entity| format!("{}{LIBRARY_SEPARATOR}{entity}", library.url()))
            .collect();
        let destinations = self.resolver().resolve_all(&addresses)?;

        let mut response = Response::new();
        for destination in &destinations {
            let blob = match library.read(self.kind.collection(), destination.entity()) {
                Ok(blob) => blob,
                Err(e) => {
                    response.merge(local_failure(e));
                    continue;
                }
            };

            if self.flags.dry_run {
                response.out(format!("Would update {destination} (dry run)"));
                continue;
            }

            response.out(format!("Updating {destination}"));
            log::info!("Updating {} from {}", destination, library.name());
            response.merge(self.pool.execute(
                destination,
                &blob,
                self.kind.update_command(),
                destination.entity(),
            ));
        }

        Ok(response)
    }
}
