// Application layer: wires storage, config and geocoder into a runnable pipeline.

pub mod spreadsheet_pipeline;
