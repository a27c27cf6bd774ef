// Shared ONNX model storage and download helpers.

pub mod download;
