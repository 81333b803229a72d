//! Functional Patterns for Service Layer
//!
//! Provides reusable functional programming patterns for service operations.
//! These patterns enable composable, testable business logic through
//! higher-order functions and monadic compositions.

use crate::{
    config::db::Pool,
    error::{ServiceError, ServiceResult},
};
use diesel::{Connection, PgConnection};
use std::marker::PhantomData;

/// Composable query operations using the Reader monad pattern
///
/// This allows building complex database operations from smaller, composable pieces
/// without explicitly passing the connection around.
pub struct QueryReader<T> {
    run: Box<dyn Fn(&mut PgConnection) -> ServiceResult<T> + Send + Sync>,
}

impl<T> QueryReader<T> {
    /// Create a new QueryReader from a function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut PgConnection) -> ServiceResult<T> + Send + Sync + 'static,
    {
        Self { run: Box::new(f) }
    }

    /// Execute the query with the provided connection
    pub fn run(&self, conn: &mut PgConnection) -> ServiceResult<T> {
        (self.run)(conn)
    }

    /// Chain another query operation that depends on the result of this one
    pub fn and_then<U, F>(self, f: F) -> QueryReader<U>
    where
        F: Fn(T) -> QueryReader<U> + Send + Sync + 'static,
        T: 'static,
    {
        QueryReader::new(move |conn| {
            let result = self.run(conn)?;
            f(result).run(conn)
        })
    }

    /// Execute this query within a transaction
    ///
    /// A failing query rolls the transaction back and surfaces its own
    /// `ServiceError`, so domain outcomes such as `Conflict` keep their
    /// status code across the rollback.
    pub fn transaction(self) -> QueryReader<T>
    where
        T: 'static,
    {
        QueryReader::new(move |conn| {
            let mut failure: Option<ServiceError> = None;
            let outcome = conn.transaction::<T, diesel::result::Error, _>(|conn| {
                self.run(conn).map_err(|e| {
                    log::error!("Transaction operation failed, rolling back: {}", e);
                    failure = Some(e);
                    diesel::result::Error::RollbackTransaction
                })
            });

            outcome.map_err(|e| match failure.take() {
                Some(service_error) => service_error,
                None => ServiceError::internal_server_error(format!("Transaction failed: {}", e)),
            })
        })
    }
}

/// Execute a QueryReader with a database pool
pub fn run_query<T>(reader: QueryReader<T>, pool: &Pool) -> ServiceResult<T> {
    pool.get()
        .map_err(|e| {
            ServiceError::internal_server_error(format!("Failed to get database connection: {}", e))
        })
        .and_then(|mut conn| reader.run(&mut conn))
}

/// Functional validation combinator
pub struct Validator<T> {
    rules: Vec<Box<dyn Fn(&T) -> ServiceResult<()> + Send + Sync>>,
    _phantom: PhantomData<T>,
}

impl<T> Validator<T> {
    /// Create a new empty validator
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Add a validation rule
    pub fn rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&T) -> ServiceResult<()> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    /// Validate the input against all rules
    pub fn validate(&self, input: &T) -> ServiceResult<()> {
        for rule in &self.rules {
            rule(input)?;
        }
        Ok(())
    }
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator() {
        let validator = Validator::<i32>::new()
            .rule(|&x| {
                if x > 0 {
                    Ok(())
                } else {
                    Err(ServiceError::bad_request("Must be positive"))
                }
            })
            .rule(|&x| {
                if x < 100 {
                    Ok(())
                } else {
                    Err(ServiceError::bad_request("Must be less than 100"))
                }
            });

        assert!(validator.validate(&50).is_ok());
        assert!(validator.validate(&-1).is_err());
        assert!(validator.validate(&101).is_err());
    }

    #[test]
    fn test_validator_reports_first_failing_rule() {
        let validator = Validator::<i32>::new()
            .rule(|&x| {
                if x > 0 {
                    Ok(())
                } else {
                    Err(ServiceError::bad_request("Must be positive"))
                }
            })
            .rule(|_| Err(ServiceError::bad_request("Always fails")));

        let err = validator.validate(&-1).unwrap_err();
        assert_eq!(err.message(), "Must be positive");
    }
}
