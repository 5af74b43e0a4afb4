//! # transfer
//!
//! Moves Jenkins job, view and node configurations between instances and a
//! local library.
//!
//! ## Overview
//!
//! - [`destination`] turns URLs and `<base>::<entity>` references into a
//!   [`Destination`]
//! - [`pool`] keeps one remote channel per host and runs CLI commands
//! - [`handler`] implements clone, download, update, delete and pull for one
//!   entity [`Kind`]
//! - [`dispatch`] holds the command table shared by the command line and
//!   recipes
//! - [`recipe`] evaluates recipe files step by step
//!
//! Every operation reports through a [`Response`]: output of all entities in
//! call order plus the first non-zero return code.
//!
//! ## Example
//!
//! ```
//! use transfer::backend::mock::MockConnector;
//! use transfer::{ExecutorPool, Kind, Handler, TransferFlags};
//!
//! let mock = MockConnector::new();
//! mock.respond_ok("https://old.example/", "get-job", "build", "<project/>");
//! let pool = ExecutorPool::new(mock.clone());
//! let flags = TransferFlags::default();
//!
//! let response = Handler::new(&pool, Kind::Job, &flags)
//!     .clone_entity(&[
//!         "https://old.example/job/build".to_string(),
//!         "https://new.example/job/build".to_string(),
//!     ])
//!     .unwrap();
//!
//! assert!(response.succeeded());
//! assert_eq!(mock.calls_to("update-job").len(), 1);
//! ```

pub mod backend;
pub mod destination;
pub mod dispatch;
pub mod error;
pub mod fixup;
pub mod handler;
pub mod kind;
pub mod pool;
pub mod recipe;
pub mod response;

pub use destination::{Destination, Resolver};
pub use dispatch::{Dispatcher, Invocation, Operation, TransferDispatcher};
pub use error::{Error, Result};
pub use handler::{Handler, TransferFlags};
pub use kind::Kind;
pub use pool::ExecutorPool;
pub use recipe::RecipeRunner;
pub use response::{FAILURE_CODE, LOCAL_FAILURE_CODE, Response};
