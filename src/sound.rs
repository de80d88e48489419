#[cfg(feature = "sound")]
use std::fs::File;
#[cfg(feature = "sound")]
use std::io::BufReader;
#[cfg(feature = "sound")]
use std::path::PathBuf;
#[cfg(feature = "sound")]
use tracing::warn;

#[cfg(feature = "sound")]
const SOUND_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

/// Best-effort audio. Playback failure is logged and swallowed, never
/// surfaced to gameplay.
pub struct SoundPlayer
{
    #[cfg(feature = "sound")]
    output: Option<(rodio::OutputStream, rodio::OutputStreamHandle)>,
}

impl SoundPlayer
{
    pub fn new() -> Self
    {
        #[cfg(feature = "sound")]
        let output = match rodio::OutputStream::try_default() {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!("audio output unavailable: {err}");
                None
            }
        };

        Self {
            #[cfg(feature = "sound")]
            output,
        }
    }

    pub fn disabled() -> Self
    {
        Self {
            #[cfg(feature = "sound")]
            output: None,
        }
    }

    #[cfg(feature = "sound")]
    pub fn play(&self, id: &str)
    {
        let Some((_stream, handle)) = &self.output else {
            return;
        };
        let Some(path) = find_sound_file(id) else {
            warn!("no sound file for '{id}' under assets/");
            return;
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                warn!("failed to open {}: {err}", path.display());
                return;
            }
        };
        let source = match rodio::Decoder::new(BufReader::new(file)) {
            Ok(source) => source,
            Err(err) => {
                warn!("failed to decode {}: {err}", path.display());
                return;
            }
        };
        match rodio::Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(source);
                sink.detach();
            }
            Err(err) => warn!("failed to start playback of '{id}': {err}"),
        }
    }

    #[cfg(not(feature = "sound"))]
    pub fn play(&self, id: &str)
    {
        tracing::debug!("sound support compiled out, skipping '{id}'");
    }
}

#[cfg(feature = "sound")]
fn find_sound_file(id: &str) -> Option<PathBuf>
{
    SOUND_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("assets/{id}.{ext}")))
        .find(|path| path.exists())
}
