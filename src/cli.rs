use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use card_buyback_lib::infrastructure::StrategyOrder;

#[derive(Parser)]
#[command(name = "card-buyback")]
#[command(about = "買取価格表とカード画像の取得・照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 設定ファイル (JSON/TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 画像取得の優先順 (static-first / spreadsheet-first / network-monitor-first)
    #[arg(long, global = true)]
    pub strategy_order: Option<StrategyOrder>,

    /// 画像サイズ (THUMBNAIL..ORIGINAL またはピクセル数)
    #[arg(long, global = true)]
    pub image_size: Option<String>,

    /// 実行コンテキスト
    #[arg(long, value_enum, default_value = "server", global = true)]
    pub context: ContextKind,

    /// 静的ファイルの配信元 (例: http://localhost:3000)
    #[arg(long, global = true)]
    pub static_origin: Option<String>,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContextKind {
    /// ブラウザなし
    Server,
    /// ネットワーク監視を有効化
    Browser,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 価格表と画像を取得して照合結果を出力
    Refresh {
        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 型番の前方一致・タイトルの部分一致で検索
    Search {
        /// 検索語
        #[arg(required = true)]
        query: String,
    },

    /// 画像データのスナップショットを出力
    Images {
        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
