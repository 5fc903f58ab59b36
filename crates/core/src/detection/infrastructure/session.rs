use std::path::Path;

use ndarray::Array4;

/// Memory layout of an image input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Square image input a model expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub size: u32,
    pub layout: TensorLayout,
}

impl InputSpec {
    /// Reads layout and resolution from a 4-D input shape.
    ///
    /// The channel axis is whichever of axis 1 or 3 holds 3. Dynamic or
    /// unreadable dimensions fall back to `default_size`.
    pub fn from_shape(shape: &[i64], default_size: u32) -> Self {
        if shape.len() != 4 {
            return Self {
                size: default_size,
                layout: TensorLayout::Nchw,
            };
        }
        let (layout, height) = if shape[3] == 3 && shape[1] != 3 {
            (TensorLayout::Nhwc, shape[1])
        } else {
            (TensorLayout::Nchw, shape[2])
        };
        let size = if height > 0 {
            height as u32
        } else {
            default_size
        };
        Self { size, layout }
    }

    pub fn tensor_shape(&self) -> (usize, usize, usize, usize) {
        let s = self.size as usize;
        match self.layout {
            TensorLayout::Nchw => (1, 3, s, s),
            TensorLayout::Nhwc => (1, s, s, 3),
        }
    }
}

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Opens a model and reads its image input layout.
pub fn load_model(
    model_path: &Path,
    default_size: u32,
) -> Result<(ort::session::Session, InputSpec), Box<dyn std::error::Error>> {
    let session = ort::session::Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;

    let spec = session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                Some(InputSpec::from_shape(shape, default_size))
            } else {
                None
            }
        })
        .ok_or_else(|| format!("{} has no tensor input", model_path.display()))?;

    log::debug!(
        "Loaded {} ({}x{} {:?})",
        model_path.display(),
        spec.size,
        spec.size,
        spec.layout
    );
    Ok((session, spec))
}

/// One model output copied out of the session.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl OutputTensor {
    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }
}

/// Runs a single-input model and copies every float output.
pub fn run_model(
    session: &mut ort::session::Session,
    input: Array4<f32>,
) -> Result<Vec<OutputTensor>, Box<dyn std::error::Error>> {
    let input_value = ort::value::Tensor::from_array(input)?;
    let outputs = session.run(ort::inputs![input_value])?;

    let mut tensors = Vec::with_capacity(outputs.len());
    for i in 0..outputs.len() {
        let array = outputs[i].try_extract_array::<f32>()?;
        tensors.push(OutputTensor {
            shape: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        });
    }
    Ok(tensors)
}
