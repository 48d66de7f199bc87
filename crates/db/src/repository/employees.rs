//! Employee persistence contract.

use crate::models::Employee;

use super::{CrudRepository, MemoryRepository, MySqlRepository};

/// [`CrudRepository`] bound to [`Employee`].
pub trait EmployeeRepository: CrudRepository<Employee> {}

impl<R: CrudRepository<Employee> + ?Sized> EmployeeRepository for R {}

pub type MySqlEmployeeRepository = MySqlRepository<Employee>;
pub type MemoryEmployeeRepository = MemoryRepository<Employee>;
