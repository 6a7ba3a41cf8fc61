use serde::{Serialize, de::DeserializeOwned};

use crate::errors::RecordingError;

/// Appends node state to a MessagePack byte stream. Nodes write their fields in a fixed order,
/// base part first, and read them back in exactly that order.
#[derive(Debug, Default)]
pub struct GraphStateRecorder {
    buffer: Vec<u8>,
}

impl GraphStateRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RecordingError> {
        rmp_serde::encode::write(&mut self.buffer, value)?;
        Ok(())
    }

    pub fn finish(self) -> GraphStateRecording {
        GraphStateRecording { bytes: self.buffer }
    }
}

/// Recorded state of a whole graph instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStateRecording {
    bytes: Vec<u8>,
}

impl GraphStateRecording {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reader(&self) -> GraphStateReader<'_> {
        GraphStateReader {
            remaining: &self.bytes,
        }
    }
}

pub struct GraphStateReader<'a> {
    remaining: &'a [u8],
}

impl GraphStateReader<'_> {
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T, RecordingError> {
        Ok(rmp_serde::from_read(&mut self.remaining)?)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_read_back_in_write_order() {
        let mut recorder = GraphStateRecorder::new();
        recorder.write(&0.25_f32).unwrap();
        recorder.write(&3_u32).unwrap();
        recorder.write(&Some("walk".to_string())).unwrap();

        let recording = recorder.finish();
        let mut reader = recording.reader();
        assert_eq!(reader.read::<f32>().unwrap(), 0.25);
        assert_eq!(reader.read::<u32>().unwrap(), 3);
        assert_eq!(reader.read::<Option<String>>().unwrap(), Some("walk".into()));
        assert!(reader.is_exhausted());
    }

    #[test]
    fn reading_past_the_end_fails() {
        let recording = GraphStateRecorder::new().finish();
        assert!(matches!(
            recording.reader().read::<f32>(),
            Err(RecordingError::Decode(_))
        ));
    }
}
