//! Typed functions exposed by [`Callable`](super::Callable) namespaces.
//!
//! A [`Func`] wraps a host closure together with the [`Shape`] of each of its
//! parameters. Arguments arrive as dynamic values and are decoded with
//! [`FromValue`] before the closure runs, so an implementation never sees a
//! value of the wrong type.

use super::namespace::Object;
use crate::encoding::{FromValue, Shape};
use crate::error::CallError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

type Thunk = dyn Fn(&[Value]) -> Result<Object, CallError> + Send + Sync;

/// A callable host function with a fixed parameter list.
#[derive(Clone)]
pub struct Func {
    params: Vec<Shape>,
    thunk: Arc<Thunk>,
}

impl Func {
    /// Builds a function from a closure taking up to six [`FromValue`]
    /// arguments and returning an [`Object`] or a `Result<Object, E>`.
    ///
    /// ```
    /// use nsplug::framework::{Func, Object};
    /// use nsplug::Value;
    ///
    /// let add = Func::new(|a: i64, b: i64| Object::value(a + b));
    /// assert_eq!(add.arity(), 2);
    ///
    /// let out = add.call(&[Value::Int(1), Value::String("2".into())]).unwrap();
    /// assert!(matches!(out, Object::Value(Value::Int(3))));
    /// ```
    pub fn new<F, Args, R>(f: F) -> Self
    where
        F: IntoFunc<Args, R>,
    {
        f.into_func()
    }

    fn from_parts<T>(params: Vec<Shape>, thunk: T) -> Self
    where
        T: Fn(&[Value]) -> Result<Object, CallError> + Send + Sync + 'static,
    {
        Self {
            params,
            thunk: Arc::new(thunk),
        }
    }

    pub fn params(&self) -> &[Shape] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Checks the argument count, decodes every argument and invokes the
    /// function. Nothing runs if any argument fails to decode.
    pub fn call(&self, args: &[Value]) -> Result<Object, CallError> {
        if args.len() != self.params.len() {
            return Err(CallError::Arity {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        (self.thunk)(args)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func").field("params", &self.params).finish()
    }
}

/// Return types accepted from a function body.
pub trait CallResult {
    fn into_call_result(self) -> anyhow::Result<Object>;
}

impl CallResult for Object {
    fn into_call_result(self) -> anyhow::Result<Object> {
        Ok(self)
    }
}

impl<E> CallResult for Result<Object, E>
where
    E: Into<anyhow::Error>,
{
    fn into_call_result(self) -> anyhow::Result<Object> {
        self.map_err(Into::into)
    }
}

/// Closures convertible into a [`Func`]. `Args` is the tuple of parameter
/// types and only exists to keep the arity impls apart.
pub trait IntoFunc<Args, R> {
    fn into_func(self) -> Func;
}

macro_rules! impl_into_func {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> IntoFunc<($($arg,)*), R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: CallResult,
            $($arg: FromValue + 'static,)*
        {
            #[allow(non_snake_case, unused_variables, unused_mut, unused_assignments)]
            fn into_func(self) -> Func {
                let params = vec![$(<$arg as FromValue>::shape()),*];
                Func::from_parts(params, move |args: &[Value]| {
                    let mut index = 0usize;
                    $(
                        let $arg = {
                            let raw = args.get(index).unwrap_or(&Value::Undefined);
                            let decoded = <$arg as FromValue>::from_value(raw).map_err(|source| {
                                CallError::Argument {
                                    index,
                                    shape: <$arg as FromValue>::shape(),
                                    source,
                                }
                            })?;
                            index += 1;
                            decoded
                        };
                    )*
                    (self)($($arg),*).into_call_result().map_err(CallError::Failed)
                })
            }
        }
    };
}

impl_into_func!();
impl_into_func!(A1);
impl_into_func!(A1, A2);
impl_into_func!(A1, A2, A3);
impl_into_func!(A1, A2, A3, A4);
impl_into_func!(A1, A2, A3, A4, A5);
impl_into_func!(A1, A2, A3, A4, A5, A6);
