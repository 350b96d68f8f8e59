pub trait Builder {
    type Build;
    fn build() -> Self::Build;
}

pub use self::record_builder::*;

pub mod record_builder {

    use super::*;
    use crate::record::*;
    use serde_json::{Map, Value};

    #[derive(Debug)]
    pub struct AuctionRecordBuild {
        fields: Map<String, Value>,
    }

    impl AuctionRecordBuild {
        pub fn address(mut self, address: &str) -> Self {
            self.fields.insert(FIELD_ADDRESS.into(), address.into());
            self
        }
        pub fn city_state_zip(mut self, city_state_zip: &str) -> Self {
            self.fields
                .insert(FIELD_CITY_STATE_ZIP.into(), city_state_zip.into());
            self
        }
        pub fn lat_lng(mut self, lat: f64, lng: f64) -> Self {
            self.fields.insert("latitude".into(), lat.into());
            self.fields.insert("longitude".into(), lng.into());
            self
        }
        pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
            self.fields.insert(name.into(), value.into());
            self
        }
        pub fn finish(self) -> AuctionRecord {
            AuctionRecord::new(self.fields)
        }
    }

    impl Builder for AuctionRecord {
        type Build = AuctionRecordBuild;
        fn build() -> Self::Build {
            AuctionRecordBuild {
                fields: Map::new(),
            }
        }
    }
}
