//! BatisLens previews the SQL a MyBatis mapper statement produces for a set
//! of call-time parameters, without a database.
//!
//! # Overview
//!
//! A preview runs in three steps:
//!
//! - the statement's parameter *shape* is inferred from its `parameterType`
//!   or its mapper method signature
//! - a JSON payload is converted into typed values according to that shape
//! - the dynamic SQL tag tree (`if`, `choose`, `foreach`, `where`, `set`,
//!   `trim`, `bind`, `include`) is rendered against those values
//!
//! `#{}` placeholders are inlined as SQL literals. The result is what the
//! database would see after binding, not the prepared statement text.
//!
//! # Quick Start
//!
//! ```rust
//! use batislens_core::prelude::*;
//!
//! let mut mappers = MapperRegistry::new();
//! mappers.load_str(r#"
//!     <mapper namespace="blog">
//!         <select id="find">
//!             SELECT * FROM blog
//!             <where>
//!                 <if test="title != null">AND title = #{title}</if>
//!             </where>
//!         </select>
//!     </mapper>
//! "#).expect("Mapper parsing failed");
//!
//! let sql = SqlPreviewer::new(&mappers)
//!     .generate_sql(&StatementPath::parse("blog.find"), r#"{"title":"Rust"}"#)
//!     .expect("Preview failed");
//! assert_eq!(sql, "SELECT * FROM blog WHERE title = 'Rust'");
//! ```

extern crate self as batislens_core;

pub mod context;
pub mod convert;
pub mod error;
pub mod expr;
pub mod mapper;
pub mod model;
pub mod prelude;
pub mod preview;
pub mod render;
pub mod schema;
pub mod shape;
pub mod types;
