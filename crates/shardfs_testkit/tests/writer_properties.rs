//! Property tests for fileset writing.

use proptest::prelude::*;
use shardfs_core::{fileset_status, BlockStart, FilesetStatus, ShardId, WriterOptions};
use shardfs_testkit::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn closed_block_is_durable_and_consistent(
        shard in shard_strategy(),
        start in block_start_strategy(),
        entries in entries_strategy(32),
    ) {
        let (fs, mut writer) = memory_writer(None);
        write_block(&mut writer, shard, start, &entries).unwrap();

        let status = fileset_status(&fs, &memory_root(), shard, start);
        prop_assert_eq!(status, FilesetStatus::Durable);

        let paths = writer.paths().unwrap();
        let contents = FilesetContents::read_memory(&fs, paths).unwrap();
        prop_assert_eq!(contents.check_consistency(), Ok(()));

        let written: Vec<&TestEntry> = entries.iter().filter(|e| e.size() > 0).collect();
        let info = contents.info.unwrap();
        prop_assert_eq!(info.entries, written.len() as u64);
        prop_assert_eq!(info.start, start.as_unix_nanos());
        prop_assert_eq!(writer.entries_written(), written.len() as u64);

        for (i, entry) in written.iter().enumerate() {
            prop_assert_eq!(contents.index[i].key.as_str(), entry.key.as_str());
            let expected = entry.bytes();
            prop_assert_eq!(contents.entry(i).unwrap(), expected.as_slice());
        }
    }

    #[test]
    fn empty_entries_leave_no_trace(
        keys in prop::collection::vec(key_strategy(), 1..16),
        empties in prop::collection::vec(0usize..3, 1..16),
    ) {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), BlockStart::from_unix_nanos(0)).unwrap();
        for (key, n) in keys.iter().zip(&empties) {
            let segments: Vec<Vec<u8>> = vec![Vec::new(); *n];
            writer.write_all(key, segments.as_slice()).unwrap();
        }
        prop_assert_eq!(writer.entries_written(), 0);

        let paths = writer.paths().unwrap().clone();
        prop_assert!(fs.contents(&paths.index).unwrap().is_empty());
        prop_assert!(fs.contents(&paths.data).unwrap().is_empty());
    }

    #[test]
    fn derived_options_leave_the_original_alone(
        file_mode in mode_strategy(),
        dir_mode in mode_strategy(),
        sync in any::<bool>(),
    ) {
        let base = WriterOptions::new();
        let derived = base
            .with_new_file_mode(file_mode)
            .with_new_directory_mode(dir_mode | 0o100)
            .with_sync_on_close(sync);

        prop_assert_eq!(base, WriterOptions::default());
        prop_assert_eq!(derived.new_file_mode(), file_mode);
        prop_assert_eq!(derived.sync_on_close(), sync);

        let (fs, mut writer) = memory_writer(Some(derived));
        write_block(&mut writer, ShardId::new(9), BlockStart::from_unix_nanos(0), &[]).unwrap();
        let paths = writer.paths().unwrap();
        prop_assert_eq!(fs.file_mode(&paths.info), Some(file_mode));
        prop_assert_eq!(fs.dir_mode(&paths.shard_dir), Some(dir_mode | 0o100));
        prop_assert_eq!(writer.options(), derived);
    }
}
