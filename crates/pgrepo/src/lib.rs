//! # pgrepo
//!
//! Condition-map driven SQL generation and a generic PostgreSQL repository.
//!
//! ## Features
//!
//! - **Condition maps**: describe filters, assignments, insert rows and joins as ordered
//!   column/value maps; the generator turns them into parameterized SQL
//! - **Bound values only**: every literal travels as a `$n` parameter, numbered across the
//!   whole statement
//! - **Generic repository**: `Repository<T, P>` covers create/find/lock/update/count/delete
//!   for one table, on the pool or inside an explicit transaction
//! - **Safe defaults**: DELETE requires WHERE, UPDATE requires SET
//! - **Type-safe mapping**: Row → Struct via `FromRow`
//!
//! ```ignore
//! use pgrepo::{ConditionMap, ConditionMapSet, Direction, Repository};
//!
//! let users: Repository<User, _> = Repository::new(pgrepo::create_pool(&url)?)?;
//!
//! let recent = users
//!     .find_all_by_map(
//!         &ConditionMapSet::new()
//!             .filter(ConditionMap::and().bind("status", "active"))
//!             .order_by("created_at", Direction::Desc)
//!             .limit(10),
//!         false,
//!     )
//!     .await?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod generator;
pub mod op;
pub mod repository;
pub mod row;
pub mod transaction;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::{ConnectionPool, GenericClient, Session};
pub use condition::{ConditionMap, ConditionMapSet, JoinTarget, Pagination};
pub use config::{PoolConfig, Recycling};
pub use error::{RepoError, RepoResult};
pub use generator::{Fragment, Statement};
pub use op::{Connective, Direction, JoinKind, Op};
pub use repository::{Fetched, Projection, Repository};
pub use row::{FromRow, RowExt, Table};
pub use transaction::Transaction;
pub use value::{Literal, Merge, Param, Value, param};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "derive")]
pub use pgrepo_derive::{FromRow, Table};

// Used by derive-generated code.
#[doc(hidden)]
pub use tokio_postgres;
