use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::barcodes::parse_barcodes;
use super::features::{Feature, normalize_symbol, parse_features};
use super::gz::logical_name;
use super::meta::load_meta;
use super::{InputError, build_gene_index, detect_prefix, discover_paths, load_dataset};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_cellcomm_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

fn feature(symbol: &str, feature_type: Option<&str>) -> Feature {
    Feature {
        id: format!("ID_{}", symbol),
        symbol_raw: symbol.to_string(),
        symbol_norm: normalize_symbol(symbol),
        feature_type: feature_type.map(str::to_string),
    }
}

#[test]
fn test_feature_parsing_v2_v3() {
    let dir = make_temp_dir();
    let v2_path = dir.join("genes.tsv");
    let v3_path = dir.join("features.tsv.gz");

    write_file(&v2_path, "GENE1\tIl10\nGENE2\tTgfb1\n");
    write_gz(
        &v3_path,
        "ENSG0001\tIL10\tGene Expression\nENSG0002\tCD4_TotalSeq\tAntibody Capture\n",
    );

    let v2 = parse_features(&v2_path).unwrap();
    assert_eq!(v2.len(), 2);
    assert_eq!(v2[0].feature_type, None);
    assert_eq!(v2[1].symbol_norm, "TGFB1");

    let v3 = parse_features(&v3_path).unwrap();
    assert_eq!(v3.len(), 2);
    assert_eq!(v3[1].feature_type.as_deref(), Some("Antibody Capture"));
}

#[test]
fn test_gene_symbol_normalization() {
    assert_eq!(normalize_symbol("  ensG000001.12 "), "ENSG000001");
    assert_eq!(normalize_symbol(" Ccl22 "), "CCL22");
    assert_eq!(normalize_symbol("HLA-DRA"), "HLA-DRA");
    assert_eq!(normalize_symbol(""), "");
}

#[test]
fn test_gene_index_skips_non_expression_and_merges_duplicates() {
    let features = vec![
        feature("Il10", Some("Gene Expression")),
        feature("CD4_TotalSeq", Some("Antibody Capture")),
        feature("IL10", Some("Gene Expression")),
        feature("", None),
        feature("Foxp3", None),
    ];
    let index = build_gene_index(&features);
    assert_eq!(
        index.symbols_by_gene_id,
        vec!["IL10".to_string(), "FOXP3".to_string()]
    );
    assert_eq!(
        index.gene_id_by_feature,
        vec![Some(0), None, Some(0), None, Some(1)]
    );
}

#[test]
fn test_metadata_join() {
    let dir = make_temp_dir();
    let meta_path = dir.join("meta.tsv");
    write_file(
        &meta_path,
        "barcode\ttissue\tcluster\nAA-1\tTumor\t5\nCC-1\tMucosa\t3\n",
    );

    let barcodes = vec!["AA-1".to_string(), "BB-1".to_string(), "CC-1".to_string()];
    let meta = load_meta(&meta_path, &barcodes).unwrap();

    assert_eq!(meta.columns, vec!["tissue".to_string(), "cluster".to_string()]);
    assert_eq!(meta.rows[0], vec!["Tumor".to_string(), "5".to_string()]);
    assert_eq!(meta.rows[1], vec!["".to_string(), "".to_string()]);
    assert_eq!(meta.column_index("Cluster"), Some(1));
    assert_eq!(meta.levels(0), vec!["Mucosa".to_string(), "Tumor".to_string()]);
}

#[test]
fn test_metadata_csv_with_barcode_elsewhere() {
    let dir = make_temp_dir();
    let meta_path = dir.join("meta.csv");
    write_file(&meta_path, "tissue,cell,cluster\n\"Tumor\",AA-1,0\n");
    let meta = load_meta(&meta_path, &["AA-1".to_string()]).unwrap();
    assert_eq!(meta.columns, vec!["tissue".to_string(), "cluster".to_string()]);
    assert_eq!(meta.rows[0], vec!["Tumor".to_string(), "0".to_string()]);
}

#[test]
fn test_metadata_csv_quoted_fields_with_commas() {
    let dir = make_temp_dir();
    let meta_path = dir.join("meta.csv.gz");
    write_gz(
        &meta_path,
        "\"\",\"note\",\"tissue\",\"cluster\"\n\
         \"AAA\",\"Tumor, stage II\",\"Tumor\",\"5\"\n\
         \"BBB\",\"\",\"Mucosa\",\"3\"\n",
    );
    let barcodes = vec!["AAA".to_string(), "BBB".to_string()];
    let meta = load_meta(&meta_path, &barcodes).unwrap();
    assert_eq!(
        meta.columns,
        vec!["note".to_string(), "tissue".to_string(), "cluster".to_string()]
    );
    let tissue = meta.column_index("tissue").unwrap();
    let cluster = meta.column_index("cluster").unwrap();
    assert_eq!(meta.value(0, tissue), "Tumor");
    assert_eq!(meta.value(0, cluster), "5");
    assert_eq!(meta.value(0, 0), "Tumor, stage II");
    assert_eq!(meta.value(1, cluster), "3");
}

#[test]
fn test_metadata_empty_file_rejected() {
    let dir = make_temp_dir();
    let meta_path = dir.join("meta.tsv");
    write_file(&meta_path, "");
    assert!(matches!(
        load_meta(&meta_path, &["AA-1".to_string()]),
        Err(InputError::Parse(_))
    ));
}

#[test]
fn test_barcodes_parse_order() {
    let dir = make_temp_dir();
    let path = dir.join("barcodes.tsv.gz");
    write_gz(&path, "AA-1\nBB-1\nCC-1\n");
    let barcodes = parse_barcodes(&path).unwrap();
    assert_eq!(barcodes, vec!["AA-1", "BB-1", "CC-1"]);
    assert_eq!(logical_name(&path), "barcodes.tsv");
}

#[test]
fn test_detect_prefix() {
    let dir = make_temp_dir();
    write_file(&dir.join("GSM123_matrix.mtx"), "x");
    assert_eq!(detect_prefix(&dir).unwrap().as_deref(), Some("GSM123"));

    let plain = make_temp_dir();
    write_file(&plain.join("matrix.mtx"), "x");
    assert_eq!(detect_prefix(&plain).unwrap(), None);
}

#[test]
fn test_missing_inputs_reported() {
    let dir = make_temp_dir();
    write_file(&dir.join("matrix.mtx"), "x");
    let err = discover_paths(&dir).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_load_dataset_end_to_end() {
    let dir = make_temp_dir();
    write_gz(
        &dir.join("GSM9_features.tsv.gz"),
        "E1\tIl10\tGene Expression\nE2\tFoxp3\tGene Expression\nE3\til10\tGene Expression\n",
    );
    write_file(&dir.join("GSM9_barcodes.tsv"), "c1\nc2\n");
    write_file(
        &dir.join("GSM9_matrix.mtx"),
        "%%MatrixMarket matrix coordinate integer general\n%\n3 2 4\n1 1 2\n3 1 1\n2 2 4\n1 2 0\n",
    );
    let meta = dir.join("meta.tsv");
    write_file(&meta, "barcode\ttissue\tcluster\nc1\tTumor\t5\nc2\tMucosa\t5\n");

    let object = load_dataset("tcell", &dir, &meta).unwrap();
    assert_eq!(object.n_cells(), 2);
    assert_eq!(object.n_genes(), 2);
    assert_eq!(object.cells[0], vec![(0, 3.0)]);
    assert_eq!(object.cells[1], vec![(1, 4.0)]);
    assert_eq!(object.libsizes, vec![3.0, 4.0]);

    let mut normalized = Vec::new();
    object.for_cell_normalized(0, &mut |g, v| normalized.push((g, v)));
    assert_eq!(normalized.len(), 1);
    assert!((normalized[0].1 as f64 - (1.0f64 + 10_000.0).ln()).abs() < 1e-4);

    let sub = object.subset(&[1]);
    assert_eq!(sub.barcodes, vec!["c2".to_string()]);
    assert_eq!(sub.symbol(1), "FOXP3");
    assert_eq!(object.n_cells(), 2);
}

#[test]
fn test_matrix_shape_mismatch() {
    let dir = make_temp_dir();
    write_file(&dir.join("features.tsv"), "E1\tA\n");
    write_file(&dir.join("barcodes.tsv"), "c1\n");
    write_file(
        &dir.join("matrix.mtx"),
        "%%MatrixMarket matrix coordinate integer general\n2 1 1\n1 1 1\n",
    );
    let meta = dir.join("meta.tsv");
    write_file(&meta, "barcode\ttissue\nc1\tTumor\n");
    let err = load_dataset("x", &dir, &meta).unwrap_err();
    assert!(matches!(err, InputError::InvalidInput(_)));
}
