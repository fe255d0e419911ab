use std::path::{Path, PathBuf};

use geo::{
    BlockSpec, ColorTablePalette, Compression, EVER_FOREST, Error, GeoGrid, GeoTransform, NODATA, NumThreads, OutputWriter,
    ProcessingOptions, RasterCreateOptions, RasterSize, RasterSourceSet, SourceSeries, YearPattern,
};
use inf::progressinfo::DummyProgress;
use path_macro::path;
use rand::distr::{Distribution, Uniform};

const CODES: [u8; 10] = [0, 11, 21, 41, 42, 43, 52, 82, 90, NODATA];

fn grid(rows: usize, cols: usize) -> GeoGrid {
    GeoGrid::new(
        "",
        RasterSize::with_rows_cols(rows, cols),
        GeoTransform::new([1_000_000.0, 30.0, 0.0, 3_000_000.0, 0.0, -30.0]),
    )
}

fn write_raster(path: &Path, grid: &GeoGrid, data: &[u8]) -> PathBuf {
    let opts = RasterCreateOptions {
        nodata: Some(NODATA),
        tiled: false,
        compression: Compression::None,
        ..Default::default()
    };

    let mut writer = OutputWriter::create(path, grid, &opts).unwrap();
    writer.write_block(&BlockSpec::new(0, 0, grid.width(), grid.height()), data).unwrap();
    writer.finalize().unwrap()
}

fn read_raster(path: &Path) -> Vec<u8> {
    let set = RasterSourceSet::open(&[path]).unwrap();
    let size = set.grid().raster_size();
    set.read_block(0, &BlockSpec::new(0, 0, size.cols, size.rows)).unwrap().into_vec()
}

fn random_codes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let uniform = Uniform::new(0, CODES.len()).unwrap();
    (0..len).map(|_| CODES[uniform.sample(&mut rng)]).collect()
}

fn four_by_four_years(base: &Path) -> (PathBuf, PathBuf) {
    let grid = grid(4, 4);
    #[rustfmt::skip]
    let year_a = [
        41, 11, 43, 250,
        0, 0, 0, 0,
        0, 0, 0, 0,
        0, 0, 0, 0,
    ];
    #[rustfmt::skip]
    let year_b = [
        11, 11, 42, 250,
        0, 0, 0, 0,
        0, 0, 0, 0,
        0, 0, 0, 0,
    ];

    (
        write_raster(&path!(base / "2001" / "lc_2001.tif"), &grid, &year_a),
        write_raster(&path!(base / "2002" / "lc_2002.tif"), &grid, &year_b),
    )
}

#[test_log::test]
fn two_year_scenario() {
    let tmp = tempfile::tempdir().unwrap();
    four_by_four_years(tmp.path());

    let series = geo::discover_years(tmp.path(), &YearPattern::new("lc_{year}.tif").unwrap(), 1980).unwrap();
    assert_eq!(series.years(), vec![2001, 2002]);

    let output = path!(tmp.path() / "ever_forest" / "ever_forest.tif");
    let written = geo::build_ever_forest(
        &series,
        &output,
        &RasterCreateOptions::ever_forest(),
        &ProcessingOptions::default(),
        DummyProgress,
    )
    .unwrap();
    assert_eq!(written, output);

    let ever = read_raster(&output);
    // the latest forest year determines the forest code
    assert_eq!(&ever[0..4], &[41, NODATA, 42, NODATA]);
    assert!(ever[4..].iter().all(|&v| v == NODATA));

    let composites = geo::build_yearly_composites(
        &series,
        &output,
        &path!(tmp.path() / "ever_forest"),
        &RasterCreateOptions::yearly_composite(),
        &ProcessingOptions::default(),
        DummyProgress,
    )
    .unwrap();

    assert_eq!(
        composites,
        vec![
            path!(tmp.path() / "ever_forest" / "2001" / "ever_forest_2001.tif"),
            path!(tmp.path() / "ever_forest" / "2002" / "ever_forest_2002.tif"),
        ]
    );

    assert_eq!(&read_raster(&composites[0])[0..4], &[41, 11, 42, 250]);
    assert_eq!(&read_raster(&composites[1])[0..4], &[41, 11, 42, 250]);
    assert!(read_raster(&composites[1])[4..].iter().all(|&v| v == 0));
}

#[test_log::test]
fn ever_forest_is_reproducible() {
    let tmp = tempfile::tempdir().unwrap();
    let grid = grid(70, 45);

    let pairs: Vec<(u32, PathBuf)> = (2001..2006)
        .map(|year| {
            let path = write_raster(&tmp.path().join(format!("{year}.tif")), &grid, &random_codes(70 * 45));
            (year, path)
        })
        .collect();
    let series = SourceSeries::from_pairs(pairs).unwrap();
    let create_opts = RasterCreateOptions::ever_forest().with_block_size(16, 32);

    let first = geo::build_ever_forest(&series, &tmp.path().join("first.tif"), &create_opts, &ProcessingOptions::default(), DummyProgress).unwrap();
    let second = geo::build_ever_forest(&series, &tmp.path().join("second.tif"), &create_opts, &ProcessingOptions::default(), DummyProgress).unwrap();
    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(&second).unwrap());

    let parallel = geo::build_ever_forest(
        &series,
        &tmp.path().join("parallel.tif"),
        &create_opts,
        &ProcessingOptions::with_threads(NumThreads::Count(3)),
        DummyProgress,
    )
    .unwrap();
    assert_eq!(read_raster(&second), read_raster(&parallel));
}

#[test_log::test]
fn forest_status_and_nodata_over_multiple_blocks() {
    let tmp = tempfile::tempdir().unwrap();
    let grid = grid(40, 37);

    let years: Vec<Vec<u8>> = (0..4).map(|_| random_codes(40 * 37)).collect();
    let series = SourceSeries::from_pairs(
        years
            .iter()
            .enumerate()
            .map(|(i, data)| (2010 + i as u32, write_raster(&tmp.path().join(format!("{i}.tif")), &grid, data))),
    )
    .unwrap();

    let output = geo::build_ever_forest(
        &series,
        &tmp.path().join("ever.tif"),
        &RasterCreateOptions::ever_forest().with_block_size(16, 16),
        &ProcessingOptions::with_threads(NumThreads::AllCpus),
        DummyProgress,
    )
    .unwrap();

    let ever = read_raster(&output);
    for (i, &value) in ever.iter().enumerate() {
        let last_forest = years.iter().rev().map(|year| year[i]).find(|&v| EVER_FOREST.contains(v));
        match last_forest {
            Some(code) => assert_eq!(value, code, "pixel {i}"),
            None => assert_eq!(value, NODATA, "pixel {i}"),
        }
    }

    let composites = geo::build_yearly_composites(
        &series,
        &output,
        &tmp.path().join("yearly"),
        &RasterCreateOptions::yearly_composite().with_block_size(16, 16),
        &ProcessingOptions::with_threads(NumThreads::Count(2)),
        DummyProgress,
    )
    .unwrap();
    assert_eq!(composites.len(), 4);

    for (composite, year) in composites.iter().zip(&years) {
        let data = read_raster(composite);
        for i in 0..data.len() {
            if EVER_FOREST.contains(ever[i]) {
                assert_eq!(data[i], ever[i]);
            } else {
                assert_eq!(data[i], year[i]);
            }
        }
    }
}

#[test_log::test]
fn written_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    let grid = grid(50, 60);
    let series = SourceSeries::from_pairs([(2001, write_raster(&tmp.path().join("a.tif"), &grid, &random_codes(50 * 60)))]).unwrap();

    let ever = geo::build_ever_forest(
        &series,
        &tmp.path().join("ever.tif"),
        &RasterCreateOptions::ever_forest().with_block_size(32, 32),
        &ProcessingOptions::default(),
        DummyProgress,
    )
    .unwrap();

    let info = geo::read_raster_info(&ever).unwrap();
    assert_eq!(info.block_size, (32, 32));
    assert_eq!(info.nodata, Some(NODATA as f64));
    assert_eq!(info.compression.as_deref(), Some("LZW"));
    assert!(info.color_table.is_none());
    approx::assert_relative_eq!(info.grid.geo_transform(), grid.geo_transform());

    let composites = geo::build_yearly_composites(
        &series,
        &ever,
        tmp.path(),
        &RasterCreateOptions::yearly_composite(),
        &ProcessingOptions::default(),
        DummyProgress,
    )
    .unwrap();

    let info = geo::read_raster_info(&composites[0]).unwrap();
    assert_eq!(info.nodata, Some(NODATA as f64));
    assert_eq!(info.compression.as_deref(), Some("LZW"));
    assert_eq!(info.predictor.as_deref(), Some("2"));
    assert_eq!(info.big_tiff, Some(true));
    let palette = info.color_table.unwrap();
    assert!(palette.rgb_matches(&ColorTablePalette::nlcd()));
    assert_eq!(palette.color(42).to_bits() >> 8, 0x1c5f2c);
}

#[test_log::test]
fn misaligned_year_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_raster(&tmp.path().join("a.tif"), &grid(4, 4), &[41; 16]);
    let b = write_raster(&tmp.path().join("b.tif"), &grid(4, 5), &[41; 20]);
    let series = SourceSeries::from_pairs([(2001, a), (2002, b.clone())]).unwrap();

    let output = tmp.path().join("ever.tif");
    match geo::build_ever_forest(&series, &output, &RasterCreateOptions::ever_forest(), &ProcessingOptions::default(), DummyProgress) {
        Err(Error::GridMismatch { path, .. }) => assert_eq!(path, b),
        other => panic!("Unexpected result: {other:?}"),
    }
    assert!(!output.exists());
}

#[test_log::test]
fn missing_year_source_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_raster(&tmp.path().join("a.tif"), &grid(4, 4), &[41; 16]);
    let missing = tmp.path().join("missing.tif");
    let series = SourceSeries::from_pairs([(2001, a.clone()), (2002, missing.clone())]).unwrap();

    match geo::build_ever_forest(&series, &tmp.path().join("ever.tif"), &RasterCreateOptions::ever_forest(), &ProcessingOptions::default(), DummyProgress) {
        Err(Error::SourceOpen { path, .. }) => assert_eq!(path, missing),
        other => panic!("Unexpected result: {other:?}"),
    }

    assert!(matches!(
        geo::build_yearly_composites(
            &series,
            &tmp.path().join("no_ever.tif"),
            tmp.path(),
            &RasterCreateOptions::yearly_composite(),
            &ProcessingOptions::default(),
            DummyProgress,
        ),
        Err(Error::Configuration(_))
    ));
}

#[test_log::test]
fn uncreatable_output_directory_is_detected_before_opening_sources() {
    let tmp = tempfile::tempdir().unwrap();
    let not_a_directory = tmp.path().join("ever_forest");
    std::fs::write(&not_a_directory, b"regular file").unwrap();

    // the missing source would fail with a source open error if it were opened first
    let series = SourceSeries::from_pairs([(2001, tmp.path().join("missing.tif"))]).unwrap();
    let output = path!(not_a_directory / "ever_forest.tif");
    assert!(matches!(
        geo::build_ever_forest(&series, &output, &RasterCreateOptions::ever_forest(), &ProcessingOptions::default(), DummyProgress),
        Err(Error::Configuration(_))
    ));
}

#[test_log::test]
fn failed_run_removes_previous_output() {
    let tmp = tempfile::tempdir().unwrap();
    let output = path!(tmp.path() / "ever_forest" / "ever_forest.tif");
    write_raster(&output, &grid(4, 4), &[41; 16]);
    assert!(output.exists());

    let a = write_raster(&tmp.path().join("a.tif"), &grid(4, 4), &[42; 16]);
    let missing = tmp.path().join("missing.tif");
    let series = SourceSeries::from_pairs([(2001, a), (2002, missing.clone())]).unwrap();

    match geo::build_ever_forest(&series, &output, &RasterCreateOptions::ever_forest(), &ProcessingOptions::default(), DummyProgress) {
        Err(Error::SourceOpen { path, .. }) => assert_eq!(path, missing),
        other => panic!("Unexpected result: {other:?}"),
    }
    assert!(!output.exists());
}
