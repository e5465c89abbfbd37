// src/blocks.rs

use log::{debug, trace};

use crate::config::TensorConfig;
use crate::host::Host;
use crate::tensor_ops::{self, Tensor, TensorError};

/// Host-facing tensor operations.
///
/// Every tensor, shape and path argument is coerced through the host exactly
/// once, here, so the algorithms in `tensor_ops` only see plain trees. No
/// method fails: failures come back as in-band sentinels, an empty wrapped
/// array for array-valued operations and an empty string for path lookups.
pub struct TensorBlocks<H: Host> {
    host: H,
    config: TensorConfig,
}

impl<H: Host> TensorBlocks<H> {
    pub fn new(host: H, config: TensorConfig) -> Self {
        TensorBlocks { host, config }
    }

    pub fn config(&self) -> &TensorConfig {
        &self.config
    }

    fn placeholder(&self) -> H::Value {
        self.host.wrap(Vec::new(), true)
    }

    fn not_found(&self) -> H::Value {
        self.host.lower(Tensor::Text(String::new()))
    }

    fn wrap_tensor(&self, tensor: Tensor) -> H::Value {
        // Every caller passes an array today; a scalar result would come back
        // as a one-element array so array-valued operations stay array-valued.
        match tensor {
            Tensor::Array(items) => self.host.wrap(items, false),
            scalar => self.host.wrap(vec![scalar], false),
        }
    }

    fn wrap_or_empty(&self, op: &str, result: Result<Tensor, TensorError>) -> H::Value {
        match result {
            Ok(tensor) => self.wrap_tensor(tensor),
            Err(e) => {
                debug!("{}: {}", op, e);
                self.host.wrap(Vec::new(), false)
            }
        }
    }

    /// Coerces a tensor argument. `None` means the input is not array-like.
    fn coerce(&self, value: &H::Value) -> Option<Tensor> {
        self.host.coerce_to_plain_array(value).map(Tensor::Array)
    }

    /// Coerces a tensor argument for operations that skip empty input.
    fn coerce_non_empty(&self, op: &str, value: &H::Value) -> Option<Tensor> {
        match self.host.coerce_to_plain_array(value) {
            Some(items) if !items.is_empty() => Some(Tensor::Array(items)),
            Some(_) => {
                debug!("{}: tensor is empty, returning placeholder", op);
                None
            }
            None => {
                debug!("{}: tensor is not array-like, returning placeholder", op);
                None
            }
        }
    }

    fn check_dims(&self, entries: &[Tensor]) -> Result<Vec<usize>, TensorError> {
        if entries.len() > self.config.max_rank {
            return Err(TensorError::InvalidDimension(format!(
                "{} dimensions exceed the configured maximum of {}",
                entries.len(),
                self.config.max_rank
            )));
        }
        let dims = tensor_ops::parse_dims(entries)?;
        let size = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        match size {
            Some(size) if size <= self.config.max_elements => Ok(dims),
            _ => Err(TensorError::InvalidDimension(format!(
                "shape {:?} exceeds the configured maximum of {} elements",
                dims, self.config.max_elements
            ))),
        }
    }

    fn coerce_path(&self, value: &H::Value) -> Result<Vec<i64>, TensorError> {
        let entries = self
            .host
            .coerce_to_plain_array(value)
            .ok_or_else(|| TensorError::PathNotFound("path is not array-like".to_string()))?;
        tensor_ops::parse_path(&entries)
    }

    /// An empty tensor.
    pub fn blank(&self) -> H::Value {
        trace!("blank");
        self.placeholder()
    }

    /// A tensor of the given shape with every leaf null.
    pub fn blank_size(&self, shape: &H::Value) -> H::Value {
        trace!("blank_size");
        let entries = match self.host.coerce_to_plain_array(shape) {
            Some(entries) if !entries.is_empty() => entries,
            _ => return self.placeholder(),
        };
        let result = self
            .check_dims(&entries)
            .and_then(|dims| tensor_ops::create_tensor(&dims, &Tensor::Null));
        self.wrap_or_empty("blank_size", result)
    }

    /// The element at a 1-based path: wrapped if it is an array, bare
    /// otherwise, `""` when the path does not resolve.
    pub fn get_path(&self, path: &H::Value, tensor: &H::Value) -> H::Value {
        trace!("get_path");
        let tensor = match self.coerce_non_empty("get_path", tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        let found = self
            .coerce_path(path)
            .and_then(|path| tensor_ops::get_tensor_path(&tensor, &path).map(Tensor::clone));
        match found {
            Ok(Tensor::Array(items)) => self.host.wrap(items, false),
            Ok(scalar) => self.host.lower(scalar),
            Err(e) => {
                debug!("get_path: {}", e);
                self.not_found()
            }
        }
    }

    /// 1-based path of the first leaf identical to `value`, or an empty array.
    pub fn find_path(&self, value: &H::Value, tensor: &H::Value) -> H::Value {
        trace!("find_path");
        let tensor = match self.coerce_non_empty("find_path", tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        let target = self.host.lift(value);
        let path = tensor_ops::find_tensor_path(&tensor, &target).unwrap_or_default();
        self.host.wrap(path.into_iter().map(|i| Tensor::Number(i as f64)).collect(), false)
    }

    /// Whether any leaf is identical to `value`. Empty or non-array input
    /// holds nothing, so it answers a bare `false` rather than the wrapped
    /// empty placeholder other operations short-circuit to.
    pub fn has(&self, tensor: &H::Value, value: &H::Value) -> H::Value {
        trace!("has");
        let found = match self.coerce_non_empty("has", tensor) {
            Some(tensor) => tensor_ops::tensor_contains(&tensor, &self.host.lift(value)),
            None => false,
        };
        self.host.lower(Tensor::Bool(found))
    }

    /// Inferred shape, or an empty array for irregular input.
    pub fn shape(&self, tensor: &H::Value) -> H::Value {
        trace!("shape");
        let tensor = match self.coerce(tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        let shape = tensor_ops::tensor_shape(&tensor).unwrap_or_else(|e| {
            debug!("shape: {}", e);
            Vec::new()
        });
        self.host.wrap(shape.into_iter().map(|d| Tensor::Number(d as f64)).collect(), false)
    }

    /// Length of the inferred shape; irregular input has rank 0.
    pub fn rank(&self, tensor: &H::Value) -> H::Value {
        trace!("rank");
        let tensor = match self.coerce(tensor) {
            Some(tensor) => tensor,
            None => return self.not_found(),
        };
        let rank = tensor_ops::tensor_rank(&tensor).unwrap_or_else(|e| {
            debug!("rank: {}", e);
            0
        });
        self.host.lower(Tensor::Number(rank as f64))
    }

    /// Number of scalar leaves.
    pub fn size(&self, tensor: &H::Value) -> H::Value {
        trace!("size");
        match self.coerce(tensor) {
            Some(tensor) => self.host.lower(Tensor::Number(tensor_ops::count_scalars(&tensor) as f64)),
            None => self.not_found(),
        }
    }

    pub fn set_path(&self, path: &H::Value, tensor: &H::Value, value: &H::Value) -> H::Value {
        trace!("set_path");
        let tensor = match self.coerce_non_empty("set_path", tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        let value = self.host.lift(value);
        let updated = self
            .coerce_path(path)
            .and_then(|path| tensor_ops::set_tensor_path(&tensor, &path, &value));
        match updated {
            Ok(tensor) => self.wrap_tensor(tensor),
            Err(e) => {
                debug!("set_path: {}", e);
                self.not_found()
            }
        }
    }

    pub fn reshape(&self, tensor: &H::Value, shape: &H::Value) -> H::Value {
        trace!("reshape");
        let tensor = match self.coerce_non_empty("reshape", tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        let result = self
            .host
            .coerce_to_plain_array(shape)
            .ok_or_else(|| TensorError::InvalidDimension("shape is not array-like".to_string()))
            .and_then(|entries| self.check_dims(&entries))
            .and_then(|dims| tensor_ops::reshape_tensor(&tensor, &dims));
        self.wrap_or_empty("reshape", result)
    }

    pub fn fill(&self, tensor: &H::Value, value: &H::Value) -> H::Value {
        trace!("fill");
        let tensor = match self.coerce_non_empty("fill", tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        self.wrap_tensor(tensor_ops::fill_tensor(&tensor, &self.host.lift(value)))
    }

    pub fn transpose(&self, tensor: &H::Value) -> H::Value {
        trace!("transpose");
        let tensor = match self.coerce(tensor) {
            Some(tensor) => tensor,
            None => return self.placeholder(),
        };
        self.wrap_or_empty("transpose", tensor_ops::transpose_tensor(&tensor))
    }

    pub fn valid(&self, tensor: &H::Value) -> H::Value {
        trace!("valid");
        let valid = match self.coerce(tensor) {
            Some(tensor) => tensor_ops::tensor_valid(&tensor),
            None => false,
        };
        self.host.lower(Tensor::Bool(valid))
    }
}
