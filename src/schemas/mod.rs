pub mod schema;
pub mod validation;

pub use schema::ResponseSchema;
pub use validation::schema_violations;
