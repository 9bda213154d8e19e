/// UI languages offered by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Jp,
}

pub struct Labels {
    pub title: &'static str,
    pub placeholder: &'static str,
    pub get_clip: &'static str,
    pub download: &'static str,
    pub loading: &'static str,
    pub play_pause: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub manual_hint: &'static str,
}

const EN: Labels = Labels {
    title: "Twitch Clip to MP3 Downloader",
    placeholder: "Enter Twitch Clip URL",
    get_clip: "Get Clip",
    download: "Download MP3",
    loading: "Downloading and converting, please wait...",
    play_pause: "Play / Pause",
    start: "Start",
    end: "End",
    manual_hint: "Waveform unavailable - drag across the strip to select a range",
};

const JP: Labels = Labels {
    title: "TwitchクリップMP3ダウンローダー",
    placeholder: "TwitchクリップのURLを入力",
    get_clip: "クリップを取得",
    download: "MP3をダウンロード",
    loading: "ダウンロードと変換中です、お待ちください...",
    play_pause: "再生/一時停止",
    start: "開始",
    end: "終了",
    manual_hint: "波形を表示できません。バーをドラッグして範囲を選択してください",
};

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Jp => &JP,
    }
}
