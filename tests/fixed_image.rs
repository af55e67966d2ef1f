use rvhd_fixed::{
    checksum, ops, sizes, Disk, DiskType, ErrorKind, FixedImage, Footer, Geometry, HostOs, VhdConfig, VhdError,
    FOOTER_SIZE,
};

use proptest::prelude::*;
use std::path::Path;

fn footer_bytes(path: &Path) -> [u8; FOOTER_SIZE] {
    let data = std::fs::read(path).unwrap();
    let mut bytes = [0_u8; FOOTER_SIZE];
    bytes.copy_from_slice(&data[data.len() - FOOTER_SIZE..]);
    bytes
}

#[test]
fn create_4mib_image() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.vhd");
    let config = VhdConfig::default();

    let summary = ops::create_image(&path, 4 * sizes::MIB, &config).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 4 * sizes::MIB + 512);
    assert_eq!(summary.capacity, 4 * sizes::MIB);
    assert_eq!(summary.sector_count, 8192);
    assert_eq!(summary.max_lba, 8191);
    assert_eq!(summary.geometry, Geometry::chs(120, 4, 17));

    let footer = FixedImage::inspect(&path, &config).unwrap();
    assert_eq!(footer.disk_type, DiskType::FixedHardDisk);
    assert_eq!(footer.original_size, 4 * sizes::MIB);
    assert_eq!(footer.current_size, footer.original_size);
    assert_eq!(footer.geometry, Geometry::from_total_sectors(8192));
    assert_eq!(footer.unique_id, summary.unique_id);
    assert_eq!(footer.host_os(), Some(HostOs::current()));
    assert!(footer.verify());

    // only the footer lands in the directory
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn data_region_starts_zeroed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zero.vhd");
    FixedImage::create(&path, 64 * sizes::KIB, &VhdConfig::default()).unwrap();

    let data = std::fs::read(&path).unwrap();
    assert!(data[..64 * 1024].iter().all(|&b| b == 0));
    assert_eq!(&data[64 * 1024..64 * 1024 + 8], b"conectix");
}

#[test]
fn round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = VhdConfig::default();

    for size in [config.min_bytes(), 4 * sizes::MIB, 10 * sizes::MIB + 512, 4 * sizes::MIB + 100] {
        let path = dir.path().join(format!("{}.vhd", size));
        let img = FixedImage::create(&path, size, &config).unwrap();

        let bytes = footer_bytes(&path);
        assert_eq!(bytes, img.footer().to_bytes());

        let decoded = Footer::from_bytes(&bytes).unwrap();
        assert_eq!(&decoded, img.footer());
        assert_eq!(decoded.to_bytes(), bytes);
    }
}

#[test]
fn size_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let config = VhdConfig::default().with_max_bytes(8 * sizes::MIB);

    let kind = |size| {
        FixedImage::create(dir.path().join(format!("b{}.vhd", size)), size, &config)
            .err()
            .map(|e| e.kind())
    };

    assert_eq!(kind(config.min_bytes() - 1), Some(ErrorKind::SizeOutOfRange));
    assert_eq!(kind(config.max_bytes() + 1), Some(ErrorKind::SizeOutOfRange));
    assert_eq!(kind(config.min_bytes()), None);
    assert_eq!(kind(config.max_bytes()), None);
}

#[test]
fn legacy_floor() {
    let dir = tempfile::tempdir().unwrap();
    let config = VhdConfig::legacy();

    let res = FixedImage::create(dir.path().join("small.vhd"), 4 * sizes::MIB - 512, &config);
    assert!(matches!(res, Err(VhdError::SizeOutOfRange { min, .. }) if min == 4 * sizes::MIB));
    assert!(FixedImage::create(dir.path().join("ok.vhd"), 4 * sizes::MIB, &config).is_ok());
}

#[test]
fn create_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("once.vhd");
    let first = ops::create_image(&path, 4 * sizes::MIB, &VhdConfig::default()).unwrap();

    let err = ops::create_image(&path, 4 * sizes::MIB, &VhdConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(FixedImage::inspect(&path, &VhdConfig::default()).unwrap().unique_id, first.unique_id);
}

#[test]
fn inspect_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = VhdConfig::default();

    let err = FixedImage::inspect(dir.path().join("absent.vhd"), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // one byte short of the smallest image
    let tiny = dir.path().join("tiny.vhd");
    std::fs::write(&tiny, vec![0_u8; (config.min_bytes() + 511) as usize]).unwrap();
    assert_eq!(FixedImage::inspect(&tiny, &config).unwrap_err().kind(), ErrorKind::SizeOutOfRange);

    // right size, no footer
    let blank = dir.path().join("blank.vhd");
    std::fs::write(&blank, vec![0_u8; (config.min_bytes() + 512) as usize]).unwrap();
    assert_eq!(FixedImage::inspect(&blank, &config).unwrap_err().kind(), ErrorKind::MalformedFooter);
}

#[test]
fn corrupted_footer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.vhd");
    let config = VhdConfig::default();
    FixedImage::create(&path, 4 * sizes::MIB, &config).unwrap();

    // bump the low byte of current_size
    let mut data = std::fs::read(&path).unwrap();
    let footer_at = data.len() - FOOTER_SIZE;
    data[footer_at + 55] ^= 0x01;
    std::fs::write(&path, &data).unwrap();

    match FixedImage::inspect(&path, &config) {
        Err(VhdError::ChecksumMismatch { stored, computed }) => assert_ne!(stored, computed),
        other => panic!("unexpected {:?}", other),
    }

    let lenient = VhdConfig::default().with_verify_checksum(false);
    let footer = FixedImage::inspect(&path, &lenient).unwrap();
    assert_eq!(footer.current_size, 4 * sizes::MIB + 1);
    assert!(!footer.verify());
}

#[test]
fn sector_isolation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iso.vhd");
    let config = VhdConfig::default();
    FixedImage::create(&path, 4 * sizes::MIB, &config).unwrap();

    let img = FixedImage::open(&path, &config).unwrap();
    img.write_sector(9, &[0x01; 512]).unwrap();
    img.write_sector(11, &[0x03; 512]).unwrap();

    let mut pattern = [0_u8; 512];
    for (i, b) in pattern.iter_mut().enumerate() {
        *b = (i * 7) as u8;
    }
    img.write_sector(10, &pattern).unwrap();

    assert_eq!(img.read_sector(10).unwrap(), pattern);
    assert_eq!(img.read_sector(9).unwrap(), [0x01; 512]);
    assert_eq!(img.read_sector(11).unwrap(), [0x03; 512]);

    // the footer is untouched by data writes
    img.write_sector(img.max_lba(), &[0xFF; 512]).unwrap();
    drop(img);
    assert!(FixedImage::inspect(&path, &config).unwrap().verify());
}

#[test]
fn write_then_read_first_sector() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aa.vhd");
    let source = dir.path().join("aa.bin");
    let config = VhdConfig::default();

    ops::create_image(&path, 4 * sizes::MIB, &config).unwrap();
    std::fs::write(&source, [0xAA_u8; 512]).unwrap();

    assert_eq!(ops::write_sector(&path, 0, &source, &config).unwrap(), 1);
    assert_eq!(ops::read_sector(&path, 0, &config).unwrap(), [0xAA; 512]);
    assert_eq!(ops::read_sector(&path, 1, &config).unwrap(), [0x00; 512]);
}

#[test]
fn write_source_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.vhd");
    let source = dir.path().join("p.bin");
    let config = VhdConfig::default();
    let summary = ops::create_image(&path, 4 * sizes::MIB, &config).unwrap();

    // 2.5 sectors: three sectors must fit, two get written
    std::fs::write(&source, vec![0x5C_u8; 1280]).unwrap();
    assert_eq!(ops::write_sector(&path, summary.max_lba - 2, &source, &config).unwrap(), 2);
    assert_eq!(ops::read_sector(&path, summary.max_lba - 1, &config).unwrap(), [0x5C; 512]);
    assert_eq!(ops::read_sector(&path, summary.max_lba, &config).unwrap(), [0; 512]);

    let err = ops::write_sector(&path, summary.max_lba - 1, &source, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);

    let err = ops::write_sector(&path, summary.max_lba + 1, &source, &config).unwrap_err();
    assert!(matches!(err, VhdError::OutOfBounds { count: 1, .. }));

    let err = ops::read_sector(&path, summary.max_lba + 1, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);
}

#[test]
fn inspect_and_dump_views() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("view.vhd");
    let source = dir.path().join("view.bin");
    let config = VhdConfig::default();
    ops::create_image(&path, 4 * sizes::MIB, &config).unwrap();

    let view = ops::inspect_image(&path, &config).unwrap();
    assert_eq!(view.file_size, 4 * sizes::MIB + 512);
    assert_eq!(view.max_lba, 8191);
    let text = view.to_string();
    assert!(text.contains("* LBA range: 0 - 8191\n"));
    assert!(text.contains("cookie: conectix\n"));
    assert!(text.contains("disk type: Fixed hard disk\n"));

    let mut payload = [0_u8; 512];
    payload[..5].copy_from_slice(b"hello");
    std::fs::write(&source, payload).unwrap();
    ops::write_sector(&path, 2, &source, &config).unwrap();

    let dump = ops::dump_sector(&path, 2, &config).unwrap();
    assert_eq!(
        dump.lines().next().unwrap(),
        "00000400: 6865 6c6c 6f00 0000 0000 0000 0000 0000  hello..........."
    );
    assert_eq!(dump.lines().count(), 32);
}

#[test]
fn open_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cap.vhd");
    let config = VhdConfig::default();
    FixedImage::create(&path, 10 * sizes::MIB, &config).unwrap();

    let img = FixedImage::open(&path, &config).unwrap();
    assert_eq!(img.capacity(), 10 * sizes::MIB);
    assert_eq!(img.sector_count(), 20480);
    assert_eq!(img.geometry(), Geometry::chs(301, 4, 17));
    assert_eq!(img.path(), path.as_path());
}

#[test]
fn sector_io_at_size_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ceiling.vhd");
    let source = dir.path().join("ones.bin");
    let config = VhdConfig::default().with_max_bytes(8 * sizes::MIB);

    let summary = ops::create_image(&path, config.max_bytes(), &config).unwrap();
    assert_eq!(summary.max_lba, 16383);

    std::fs::write(&source, [0xFF_u8; 512]).unwrap();
    assert_eq!(ops::write_sector(&path, summary.max_lba, &source, &config).unwrap(), 1);
    assert_eq!(ops::read_sector(&path, summary.max_lba, &config).unwrap(), [0xFF; 512]);
    assert_eq!(ops::read_sector(&path, 0, &config).unwrap(), [0; 512]);

    let err = ops::read_sector(&path, summary.max_lba + 1, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_single_byte_flip_breaks_checksum(index in 0_usize..85, flip in 1_u8..=255) {
        prop_assume!(!checksum::CHECKSUM_FIELD.contains(&index));

        let footer = Footer::new_fixed(4 * sizes::MIB, &VhdConfig::default());
        let mut bytes = footer.to_bytes();
        prop_assert!(checksum::verify(&bytes));

        bytes[index] ^= flip;
        prop_assert!(!checksum::verify(&bytes));
    }

    #[test]
    fn footer_round_trip(sectors in 68_u64..8_388_607) {
        let footer = Footer::new_fixed(sectors * 512, &VhdConfig::default());
        let decoded = Footer::from_bytes(&footer.to_bytes()).unwrap();

        prop_assert_eq!(decoded, footer);
        prop_assert!(decoded.verify());
        prop_assert_eq!(decoded.geometry, Geometry::from_total_sectors(sectors as u32));
    }
}
