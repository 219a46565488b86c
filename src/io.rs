//! Reading measurements and configurations from disk and writing processed arrays.
//!
//! Measurements are exchanged as `.npz` archives, configurations as JSON files.

use crate::config::{Configuration, ConfigurationModel, MeasurementMode};
use crate::data_container::{acquisition_time_axis, RawData, Transmission};
use crate::error::{ProcessingError, Result};
use crate::processor::ProcessedArray;
use ndarray::{Array, Array1, Dimension};
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement};
use num_complex::Complex64;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

struct Archive<'a, R: Read + Seek> {
    reader: NpzReader<R>,
    names: Vec<String>,
    path: &'a Path,
}

impl<'a, R: Read + Seek> Archive<'a, R> {
    /// Entry name of `name`, numpy stores arrays as `<name>.npy`.
    fn entry(&self, name: &str) -> Option<String> {
        let with_extension = format!("{}.npy", name);
        self.names
            .iter()
            .find(|entry| *entry == name || **entry == with_extension)
            .cloned()
    }

    fn optional<A, D>(&mut self, name: &str) -> Result<Option<Array<A, D>>>
    where
        A: ReadableElement,
        D: Dimension,
    {
        match self.entry(name) {
            Some(entry) => Ok(Some(self.reader.by_name(&entry)?)),
            None => Ok(None),
        }
    }

    fn required<A, D>(&mut self, name: &str) -> Result<Array<A, D>>
    where
        A: ReadableElement,
        D: Dimension,
    {
        self.optional(name)?.ok_or_else(|| ProcessingError::MissingArray {
            name: name.to_string(),
            path: self.path.to_path_buf(),
        })
    }
}

/// Reads a measurement from an `.npz` archive.
///
/// The transmission cube is stored under the data name of the measurement mode (`transmission`
/// or `transientTrans`), next to `wn_axis` and the optional `std_peak_acqs`, `std_peak`,
/// `time_axis`, `normalization_vector` and `peak_mean_amp`. A time-integrated measurement
/// without `time_axis` gets one from its acquisition `timestamps` in us, if present.
pub fn open_from_npz(path: &Path, config: &Configuration) -> Result<RawData> {
    let mode = config.measurement_mode()?;
    let mut reader = NpzReader::new(File::open(path)?)?;
    let names = reader.names()?;
    let mut archive = Archive {
        reader,
        names,
        path,
    };

    let transmission = match mode {
        MeasurementMode::TimeIntegrated => {
            Transmission::TimeIntegrated(archive.required(mode.data_name())?)
        }
        MeasurementMode::TimeResolved => {
            Transmission::TimeResolved(archive.required(mode.data_name())?)
        }
    };
    let wn_axis: Array1<f64> = archive.required("wn_axis")?;
    let mut raw = RawData::new(transmission, wn_axis)?;

    if let Some(std_peak_acqs) = archive.optional::<f64, _>("std_peak_acqs")? {
        raw = raw.with_std_peak_acqs(std_peak_acqs)?;
    }
    if let Some(std_peak) = archive.optional::<f64, _>("std_peak")? {
        raw = raw.with_std_peak(std_peak)?;
    }
    if let Some(time_axis) = archive.optional::<f64, _>("time_axis")? {
        raw = raw.with_time_axis(time_axis)?;
    } else if mode == MeasurementMode::TimeIntegrated {
        if let Some(timestamps) = archive.optional::<f64, _>("timestamps")? {
            let timestamps: Array1<f64> = timestamps;
            raw = raw.with_time_axis(acquisition_time_axis(
                &timestamps.to_vec(),
                config.pretrigger_acquisitions,
            ))?;
        }
    }
    if let Some(normalization) = archive.optional::<Complex64, _>("normalization_vector")? {
        raw = raw.with_normalization_vector(normalization)?;
    }
    if let Some(peak_mean_amp) = archive.optional::<f64, _>("peak_mean_amp")? {
        raw = raw.with_peak_mean_amp(peak_mean_amp)?;
    }

    log::info!("opened {:?}", path);
    Ok(raw)
}

/// Writes named arrays to an `.npz` archive.
pub fn save_to_npz(path: &Path, outputs: &[(String, ProcessedArray)]) -> Result<()> {
    let mut npz = NpzWriter::new(File::create(path)?);
    for (name, array) in outputs {
        match array {
            ProcessedArray::Complex1(data) => npz.add_array(name.as_str(), data)?,
            ProcessedArray::Complex2(data) => npz.add_array(name.as_str(), data)?,
            ProcessedArray::Real1(data) => npz.add_array(name.as_str(), data)?,
            ProcessedArray::Real2(data) => npz.add_array(name.as_str(), data)?,
        }
    }
    npz.finish()?;
    log::info!("saved {} arrays to {:?}", outputs.len(), path);
    Ok(())
}

/// Reads and validates a JSON configuration.
pub fn load_configuration(path: &Path) -> Result<Configuration> {
    let config: Configuration = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    config.validate()?;
    Ok(config)
}
