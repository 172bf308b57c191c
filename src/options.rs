use crate::error::{Result, WrapError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Number of spatial dimensions handled by the wrapping kernels.
pub const SPATIAL_DIMENSIONS: usize = 3;

/// The point the wrapped cell is centered on.
///
/// A `Center` always holds exactly three finite components.
///
/// # Example
/// ```
/// use fast_wrap::options::Center;
///
/// let center: Center = "0.5, -1, 2e1".parse().unwrap();
/// assert_eq!(center.coordinates(), &[0.5, -1.0, 20.0]);
/// assert!("1,2".parse::<Center>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 3]")]
pub struct Center([f64; SPATIAL_DIMENSIONS]);

impl Center {
    /// Creates a new center.
    ///
    /// # Errors
    /// Returns `WrapError::InvalidCenter` if a component is NaN or infinite.
    pub fn new(coordinates: [f64; SPATIAL_DIMENSIONS]) -> Result<Self> {
        if let Some((axis, value)) = coordinates
            .iter()
            .enumerate()
            .find(|(_, x)| !x.is_finite())
        {
            return Err(WrapError::center(format!(
                "component {} is {}, but must be finite",
                axis, value
            )));
        }
        Ok(Self(coordinates))
    }

    /// The origin of the coordinate system.
    pub fn origin() -> Self {
        Self([0.0; SPATIAL_DIMENSIONS])
    }

    /// Returns the components of the center.
    pub fn coordinates(&self) -> &[f64; SPATIAL_DIMENSIONS] {
        &self.0
    }
}

impl TryFrom<&[f64]> for Center {
    type Error = WrapError;

    fn try_from(values: &[f64]) -> Result<Self> {
        let coordinates: [f64; SPATIAL_DIMENSIONS] = values.try_into().map_err(|_| {
            WrapError::center(format!(
                "expected {} components, got {}",
                SPATIAL_DIMENSIONS,
                values.len()
            ))
        })?;
        Self::new(coordinates)
    }
}

impl TryFrom<Vec<f64>> for Center {
    type Error = WrapError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::try_from(values.as_slice())
    }
}

impl From<Center> for [f64; SPATIAL_DIMENSIONS] {
    fn from(center: Center) -> Self {
        center.0
    }
}

impl FromStr for Center {
    type Err = WrapError;

    /// Parses comma-separated components, e.g. `"1.0,2.5,-3"`.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|token| {
                let token = token.trim();
                token.parse::<f64>().map_err(|_| {
                    WrapError::center(format!("'{}' is not a floating point number", token))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::try_from(values)
    }
}

/// How the wrapping kernels are executed.
///
/// Both modes produce identical results; `Parallel` splits the work over frames and groups
/// with rayon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    #[default]
    Serial,
    Parallel,
}

/// Settings of a wrapping run.
///
/// Missing fields take their default values when deserializing, so a configuration file may
/// only mention the settings it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapOptions {
    /// Keep every group (residue) whole by translating its members together.
    pub whole_molecules: bool,

    /// Center of the wrapped cell. `None` means half the box lengths.
    pub center: Option<Center>,

    /// Serial or data-parallel execution.
    pub execution: Execution,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            whole_molecules: true,
            center: None,
            execution: Execution::Serial,
        }
    }
}

impl WrapOptions {
    /// Sets whether groups are kept whole.
    pub fn whole_molecules(mut self, whole_molecules: bool) -> Self {
        self.whole_molecules = whole_molecules;
        self
    }

    /// Centers the wrapped cell on `center`.
    pub fn with_center(mut self, center: Center) -> Self {
        self.center = Some(center);
        self
    }

    /// Selects the execution mode.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Loads options from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or holds an invalid
    /// center.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let options = serde_json::from_reader(reader)?;
        Ok(options)
    }
}
