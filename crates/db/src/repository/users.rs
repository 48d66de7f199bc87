//! User persistence contract.

use crate::models::User;

use super::{CrudRepository, MemoryRepository, MySqlRepository};

/// [`CrudRepository`] bound to [`User`].
///
/// Blanket-implemented: anything that stores users is a `UserRepository`.
pub trait UserRepository: CrudRepository<User> {}

impl<R: CrudRepository<User> + ?Sized> UserRepository for R {}

pub type MySqlUserRepository = MySqlRepository<User>;
pub type MemoryUserRepository = MemoryRepository<User>;
