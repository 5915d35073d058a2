// nsplug
// Namespace-tree plugin SDK: dynamic values, typed conversion, and key-chain resolution

//! A plugin exposes a tree of [`framework::Namespace`]s. A host asks for a
//! chain of keys (some of them function calls) and receives a flattened
//! [`Value`] back.
//!
//! ```
//! use nsplug::framework::{Namespace, Object, Root};
//! use nsplug::{Context, Engine, GetKey, GetReq, Value};
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! impl Namespace for Greeter {
//!     fn get(&self, key: &str) -> anyhow::Result<Object> {
//!         Ok(Object::value(format!("hello {key}")))
//!     }
//! }
//!
//! impl Root for Greeter {
//!     fn configure(&self, _config: &Context) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn as_namespace(self: Arc<Self>) -> Option<Arc<dyn Namespace>> {
//!         Some(self)
//!     }
//! }
//!
//! let engine = Engine::new(Greeter);
//! engine.configure(&Context::new()).unwrap();
//! let results = engine.get(&[GetReq::new(1, vec![GetKey::get("world")])]).unwrap();
//! assert_eq!(results[0].value, Value::String("hello world".into()));
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod framework;
pub mod plugin;
pub mod server;
pub mod value;

pub use config::{plugin_config_from_toml, EngineConfig};
pub use encoding::{decode, encode, FromValue, Shape, ToValue};
pub use error::{CallError, Error, Result};
pub use framework::{Context, Engine};
pub use plugin::{GetKey, GetReq, GetResult, Plugin, ResultsByKey};
pub use server::{InstanceRequest, InstanceResult, PluginServer};
pub use value::{MapKey, Value, ValueMap};
