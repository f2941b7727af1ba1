use {
    dutch_auction::Auction,
    serde::Serialize,
};

/// The slugs of an auction at one point in time, in the shape the slug
/// plotting script reads.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub data: Vec<SlugEntry>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlugEntry {
    pub slug_name: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub current_tick: i32,
    pub timestamp: u64,
}

impl Snapshot {
    pub fn new(auction: &Auction, current_tick: i32, timestamp: u64) -> Self {
        Self {
            data: auction
                .slugs()
                .iter()
                .map(|slug| SlugEntry {
                    slug_name: slug.id.name(),
                    tick_lower: slug.range.lower,
                    tick_upper: slug.range.upper,
                    liquidity: slug.liquidity,
                    current_tick,
                    timestamp,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_camel_case() {
        let snapshot = Snapshot {
            data: vec![SlugEntry {
                slug_name: "pdSlug1".to_string(),
                tick_lower: 2_400,
                tick_upper: 3_200,
                liquidity: 42,
                current_tick: 1_600,
                timestamp: 1_000,
            }],
        };
        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"data":[{"slugName":"pdSlug1","tickLower":2400,"tickUpper":3200,"liquidity":42,"currentTick":1600,"timestamp":1000}]}"#
        );
    }
}
