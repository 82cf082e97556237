//! Method handlers and the type-erased strategy stored in the registry.
//!
//! A handler is registered with a concrete parameter and result type. The
//! registry only sees [`MethodHandler`], which decodes the encoded params,
//! invokes the function and encodes the result.

use std::any::TypeId;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::JsonRpcErrorObject;

/// Error type handlers return. A [`JsonRpcErrorObject`] inside it is passed
/// through to the caller verbatim, anything else becomes `Internal error`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for handler functions
pub type HandlerResult<T> = Result<T, BoxError>;

/// Type-erased method handler stored in the dispatcher registry
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Name of the declared parameter type, `None` for parameterless handlers
    fn param_type(&self) -> Option<&'static str>;

    /// Name of the declared result type, `None` when the handler returns `()`
    fn result_type(&self) -> Option<&'static str>;

    /// Decode `params`, run the handler and encode its result
    async fn handle(&self, params: Option<&RawValue>) -> Result<Box<RawValue>, JsonRpcErrorObject>;
}

/// Handler built from an async function taking decoded params
pub struct FunctionHandler<P, R, F, Fut> {
    function: F,
    _marker: PhantomData<fn(P) -> (R, Fut)>,
}

impl<P, R, F, Fut> FunctionHandler<P, R, F, Fut>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    pub fn new(function: F) -> Self {
        Self {
            function,
            _marker: PhantomData,
        }
    }

    fn decode(&self, params: Option<&RawValue>) -> Result<P, JsonRpcErrorObject> {
        let encoded = params.map(RawValue::get).unwrap_or("null");
        serde_json::from_str(encoded)
            .map_err(|err| JsonRpcErrorObject::invalid_params(err.to_string()))
    }
}

#[async_trait]
impl<P, R, F, Fut> MethodHandler for FunctionHandler<P, R, F, Fut>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    fn param_type(&self) -> Option<&'static str> {
        Some(std::any::type_name::<P>())
    }

    fn result_type(&self) -> Option<&'static str> {
        declared_result::<R>()
    }

    async fn handle(&self, params: Option<&RawValue>) -> Result<Box<RawValue>, JsonRpcErrorObject> {
        let params = self.decode(params)?;
        let result = (self.function)(params).await.map_err(into_error_object)?;
        encode_result(&result)
    }
}

/// Handler built from an async function that takes no params.
/// Whatever `params` the request carries are ignored.
pub struct NoParamsHandler<R, F, Fut> {
    function: F,
    _marker: PhantomData<fn() -> (R, Fut)>,
}

impl<R, F, Fut> NoParamsHandler<R, F, Fut>
where
    R: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    pub fn new(function: F) -> Self {
        Self {
            function,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R, F, Fut> MethodHandler for NoParamsHandler<R, F, Fut>
where
    R: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    fn param_type(&self) -> Option<&'static str> {
        None
    }

    fn result_type(&self) -> Option<&'static str> {
        declared_result::<R>()
    }

    async fn handle(
        &self,
        _params: Option<&RawValue>,
    ) -> Result<Box<RawValue>, JsonRpcErrorObject> {
        let result = (self.function)().await.map_err(into_error_object)?;
        encode_result(&result)
    }
}

fn declared_result<R: 'static>() -> Option<&'static str> {
    if TypeId::of::<R>() == TypeId::of::<()>() {
        None
    } else {
        Some(std::any::type_name::<R>())
    }
}

fn encode_result<R: Serialize>(result: &R) -> Result<Box<RawValue>, JsonRpcErrorObject> {
    serde_json::value::to_raw_value(result)
        .map_err(|err| JsonRpcErrorObject::internal_error(Some(Value::String(err.to_string()))))
}

/// Map a handler error onto the wire error object
pub fn into_error_object(err: BoxError) -> JsonRpcErrorObject {
    match err.downcast::<JsonRpcErrorObject>() {
        Ok(rpc_error) => *rpc_error,
        Err(other) => JsonRpcErrorObject::internal_error(Some(Value::String(other.to_string()))),
    }
}
