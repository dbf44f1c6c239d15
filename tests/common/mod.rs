//! Shared fixtures: EPU-style session trees with metadata and movies.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::path::{Path, PathBuf};

/// One acquisition as EPU would describe it
#[derive(Debug, Clone)]
pub struct EpuImage {
    pub timestamp: String,
    pub magnification: u64,
    pub exposure: Option<f64>,
    /// Pixel size in metres
    pub pixel_size: f64,
    /// Applied defocus in metres
    pub defocus: f64,
}

impl Default for EpuImage {
    fn default() -> Self {
        Self {
            timestamp: "2024-11-05T14:32:10.1234567+01:00".to_string(),
            magnification: 130_000,
            exposure: Some(2.72),
            pixel_size: 9.3e-11,
            defocus: -1.5e-6,
        }
    }
}

impl EpuImage {
    pub fn xml(&self) -> String {
        let exposure = self
            .exposure
            .map(|e| format!("<ExposureTime>{e}</ExposureTime>"))
            .unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<MicroscopeImage xmlns="http://schemas.datacontract.org/2004/07/Fei.SharedObjects" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
  <CustomData xmlns:a="http://schemas.microsoft.com/2003/10/Serialization/Arrays">
    <a:KeyValueOfstringanyType>
      <a:Key>Aperture[C1].Name</a:Key>
      <a:Value i:type="b:string" xmlns:b="http://www.w3.org/2001/XMLSchema">2000</a:Value>
    </a:KeyValueOfstringanyType>
    <a:KeyValueOfstringanyType>
      <a:Key>Aperture[C2].Name</a:Key>
      <a:Value i:type="b:string" xmlns:b="http://www.w3.org/2001/XMLSchema">50</a:Value>
    </a:KeyValueOfstringanyType>
    <a:KeyValueOfstringanyType>
      <a:Key>AppliedDefocus</a:Key>
      <a:Value i:type="b:double" xmlns:b="http://www.w3.org/2001/XMLSchema">{defocus:E}</a:Value>
    </a:KeyValueOfstringanyType>
    <a:KeyValueOfstringanyType>
      <a:Key>DetectorCommercialName</a:Key>
      <a:Value i:type="b:string" xmlns:b="http://www.w3.org/2001/XMLSchema">Falcon 4i</a:Value>
    </a:KeyValueOfstringanyType>
    <a:KeyValueOfstringanyType>
      <a:Key>Detectors[EF-Falcon].TotalDose</a:Key>
      <a:Value i:type="b:double" xmlns:b="http://www.w3.org/2001/XMLSchema">5E+21</a:Value>
    </a:KeyValueOfstringanyType>
  </CustomData>
  <microscopeData>
    <acquisition>
      <acquisitionDateTime>{timestamp}</acquisitionDateTime>
      <camera>
        <Name>EF-Falcon</Name>
        {exposure}
      </camera>
    </acquisition>
    <core>
      <ApplicationSoftware>EPU</ApplicationSoftware>
      <ApplicationSoftwareVersion>3.6.0.7203REL</ApplicationSoftwareVersion>
    </core>
    <gun><AccelerationVoltage>300000</AccelerationVoltage></gun>
    <instrument><InstrumentModel>TITAN52336320</InstrumentModel></instrument>
    <optics>
      <EnergyFilter><EnergySelectionSlitWidth>10</EnergySelectionSlitWidth></EnergyFilter>
      <SpotIndex>5</SpotIndex>
      <TemMagnification><NominalMagnification>{magnification}</NominalMagnification></TemMagnification>
    </optics>
    <stage>
      <Position><A>0</A><B>0</B><X>1.25E-05</X><Y>-3.5E-06</Y><Z>2E-07</Z></Position>
    </stage>
  </microscopeData>
  <SpatialScale>
    <pixelSize>
      <x><numericValue>{pixel:E}</numericValue></x>
      <y><numericValue>{pixel:E}</numericValue></y>
    </pixelSize>
  </SpatialScale>
</MicroscopeImage>"#,
            defocus = self.defocus,
            timestamp = self.timestamp,
            exposure = exposure,
            magnification = self.magnification,
            pixel = self.pixel_size,
        )
    }
}

/// Write `<root>/<square>/Data/<name>.xml`, returning its path
pub fn write_image(root: &Path, square: &str, name: &str, image: &EpuImage) -> PathBuf {
    let data = root.join(square).join("Data");
    fs::create_dir_all(&data).unwrap();
    let path = data.join(format!("{name}.xml"));
    fs::write(&path, image.xml()).unwrap();
    path
}

/// Write an EER-style TIFF with `frames` directories next to `xml`
pub fn write_eer(xml: &Path, frames: u32) -> PathBuf {
    const IFD_SIZE: u32 = 2 + 12 + 4;
    let mut bytes = b"II".to_vec();
    bytes.write_u16::<LittleEndian>(42).unwrap();
    bytes.write_u32::<LittleEndian>(8).unwrap();
    for i in 0..frames {
        bytes.write_u16::<LittleEndian>(1).unwrap();
        bytes.extend_from_slice(&[0u8; 12]);
        let next = if i + 1 == frames { 0 } else { 8 + IFD_SIZE * (i + 1) };
        bytes.write_u32::<LittleEndian>(next).unwrap();
    }

    let stem = xml.file_stem().unwrap().to_str().unwrap();
    let path = xml.with_file_name(format!("{stem}_EER.eer"));
    fs::write(&path, bytes).unwrap();
    path
}
