#![no_main]

use depver::config::Config;
use depver::modfile::ParseMode;
use depver::{ManifestExtractor, ManifestRecord, SENTINEL};
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let mut lax = Config::default();
        lax.parse.mode = ParseMode::Lax;

        for extractor in [ManifestExtractor::new(), ManifestExtractor::from_config(&lax)] {
            let result =
                std::panic::catch_unwind(AssertUnwindSafe(|| extractor.extract_or_sentinel(content)));

            let Ok(json) = result else {
                panic!("extraction should not panic");
            };
            if json == SENTINEL {
                continue;
            }

            let record: ManifestRecord =
                serde_json::from_str(&json).expect("output must be a manifest record");
            for dep in &record.dependencies {
                let (path, version) = dep
                    .rsplit_once(';')
                    .expect("dependency entries must be path;version");
                assert!(!path.is_empty(), "empty dependency path in output");
                assert!(version.starts_with('v'), "non-canonical version {version}");
            }
        }
    }
});
