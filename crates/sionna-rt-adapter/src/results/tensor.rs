//! Dense N-dimensional arrays read from nested JSON lists

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Complex value written by the solver as `{"real": .., "imag": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub real: f64,
    pub imag: f64,
}

impl Complex {
    pub fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    pub fn norm(&self) -> f64 {
        self.real.hypot(self.imag)
    }
}

/// A scalar that can sit at the leaves of a nested list
pub trait Element: Sized {
    fn from_json(value: &Value) -> Option<Self>;
}

impl Element for f64 {
    /// `null` stands for a non-finite value
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(f64::NAN),
            Value::Number(number) => number.as_f64(),
            _ => None,
        }
    }
}

impl Element for i64 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl Element for Complex {
    fn from_json(value: &Value) -> Option<Self> {
        let real = value.get("real")?.as_f64()?;
        let imag = value.get("imag")?.as_f64()?;
        Some(Complex::new(real, imag))
    }
}

/// Row-major array with a fixed shape
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> NdArray<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidSummary(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Length of `axis`, zero past the last axis
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(0)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    fn offset(&self, prefix: &[usize]) -> Option<usize> {
        if prefix.len() > self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (axis, &index) in prefix.iter().enumerate() {
            if index >= self.shape[axis] {
                return None;
            }
            offset = offset * self.shape[axis] + index;
        }
        let block: usize = self.shape[prefix.len()..].iter().product();
        Some(offset * block)
    }

    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.len() {
            return None;
        }
        self.data.get(self.offset(index)?)
    }

    /// Contiguous block with the leading axes fixed to `prefix`
    pub fn block(&self, prefix: &[usize]) -> Option<&[T]> {
        let start = self.offset(prefix)?;
        let len: usize = self.shape[prefix.len()..].iter().product();
        self.data.get(start..start + len)
    }
}

impl<T: Element> NdArray<T> {
    /// Parse a nested list; the shape follows the first element of every
    /// level and ragged input is rejected
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut shape = Vec::new();
        let mut cursor = value;
        while let Value::Array(items) = cursor {
            shape.push(items.len());
            match items.first() {
                Some(first) => cursor = first,
                None => break,
            }
        }

        let mut data = Vec::with_capacity(shape.iter().product());
        flatten(value, &shape, &mut data)?;
        Ok(Self { shape, data })
    }
}

fn flatten<T: Element>(value: &Value, shape: &[usize], out: &mut Vec<T>) -> Result<()> {
    match shape.split_first() {
        None => {
            let element = T::from_json(value)
                .ok_or_else(|| Error::InvalidSummary(format!("unexpected element {}", value)))?;
            out.push(element);
        }
        Some((&len, rest)) => {
            let items = value
                .as_array()
                .filter(|items| items.len() == len)
                .ok_or_else(|| Error::InvalidSummary("ragged nested array".to_string()))?;
            for item in items {
                flatten(item, rest, out)?;
            }
        }
    }
    Ok(())
}

impl<'de, T: Element> Deserialize<'de> for NdArray<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_shape_and_indexing() {
        let array: NdArray<f64> =
            NdArray::from_json(&json!([[[1, 2, 3], [4, 5, 6]], [[7, 8, 9], [10, 11, 12]]]))
                .unwrap();
        assert_eq!(array.shape(), &[2, 2, 3]);
        assert_eq!(array.get(&[1, 0, 2]), Some(&9.0));
        assert_eq!(array.get(&[1, 0]), None);
        assert_eq!(array.get(&[2, 0, 0]), None);
        assert_eq!(array.block(&[1, 1]), Some(&[10.0, 11.0, 12.0][..]));
        assert_eq!(array.block(&[0]).map(<[f64]>::len), Some(6));
        assert_eq!(array.dim(5), 0);
    }

    #[test]
    fn test_complex_leaves() {
        let array: NdArray<Complex> = serde_json::from_value(json!([
            [{"real": 3.0, "imag": 4.0}, {"real": 0.0, "imag": 1.0}]
        ]))
        .unwrap();
        assert_eq!(array.shape(), &[1, 2]);
        assert_eq!(array.get(&[0, 0]).map(Complex::norm), Some(5.0));
    }

    #[test]
    fn test_null_is_nan() {
        let array: NdArray<f64> = NdArray::from_json(&json!([1.0, null])).unwrap();
        assert!(array.data()[1].is_nan());
    }

    #[test]
    fn test_ragged_input_is_rejected() {
        assert!(NdArray::<f64>::from_json(&json!([[1, 2], [3]])).is_err());
        assert!(NdArray::<f64>::from_json(&json!([[1, 2], ["x", 3]])).is_err());
    }

    #[test]
    fn test_empty_axis() {
        let array: NdArray<f64> = NdArray::from_json(&json!([[], []])).unwrap();
        assert_eq!(array.shape(), &[2, 0]);
        assert!(array.data().is_empty());
        assert!(NdArray::new(vec![2, 2], vec![1.0]).is_err());
    }
}
