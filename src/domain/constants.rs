//! 買取価格表・画像シートの固有特性とドメイン定数
//!
//! Google スプレッドシート上の価格表と画像シートの構造に依存する値をまとめています。

/// 価格表 CSV の構造
pub mod price_list {
    /// データ行の前にあるヘッダー行数 (タイトル行 + 列名行)
    ///
    /// 過去の版では 1 行のみスキップしていたが、公開中のシートは
    /// 1 行目にシートタイトル、2 行目に列名を持つため 2 で固定する。
    /// 取得時に 2 行目が列名行であることを検証する。
    pub const HEADER_ROWS: usize = 2;

    /// データ行に必要な最小列数 (タイトル, 型番, レアリティ, 買取価格)
    pub const MIN_COLUMNS: usize = 4;

    /// 列名行に現れるはずのラベル (列インデックス順)
    pub const EXPECTED_HEADER_LABELS: [&str; 4] = ["商品タイトル", "商品型番", "レアリティ", "買取価格"];

    /// 数値ではない「最低保証」価格を表す値
    pub const MINIMUM_GUARANTEE_PRICE: &str = "最低保証";
}

/// 画像関連の定数
pub mod image {
    /// 一致する画像が無いカードに割り当てる画像パス
    pub const NO_IMAGE_URL: &str = "/no-image.svg";

    /// 画像 CDN のホスト (サフィックス一致)
    pub const CDN_HOST_SUFFIXES: &[&str] = &["googleusercontent.com"];

    /// 画像 CDN として扱う完全一致ホスト
    pub const CDN_EXACT_HOSTS: &[&str] = &["drive.google.com"];

    /// ネットワーク監視で拾う画像レスポンスのホスト
    pub const CAPTURE_HOST: &str = "lh3.googleusercontent.com";
}

/// 画像シートの構造
pub mod image_sheet {
    /// タイトル列 (C 列)
    pub const TITLE_CELL_INDEX: usize = 2;

    /// 画像列 (E 列)
    pub const IMAGE_CELL_INDEX: usize = 4;

    /// ヘッダー・ラベル行を判別するキーワード
    pub const HEADER_KEYWORDS: &[&str] = &["タイトル", "検索ワード", "抽出条件", "価格", "画像URL"];
}
