//! Sound file lookup and the concrete [`SoundPlayer`] backends.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ambience::{AmbientSound, SoundPlayer};
use crate::config::AmbienceConfig;
use crate::error::{OverlayError, Result};

/// Extensions tried for each sound, in order
pub const SOUND_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "wav"];

/// Directory of ambient tracks named after [`AmbientSound::file_stem`]
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Find the file for `sound`, preferring mp3, then m4a, then wav
    pub fn resolve(&self, sound: AmbientSound) -> Result<PathBuf> {
        for ext in SOUND_EXTENSIONS {
            let candidate = self.dir.join(format!("{}.{}", sound.file_stem(), ext));
            if candidate.is_file() {
                debug!("Found audio file: {}", candidate.display());
                return Ok(candidate);
            }
        }
        Err(OverlayError::AudioResourceMissing {
            sound,
            dir: self.dir.clone(),
        })
    }
}

/// Player used when the crate is built without the `audio` feature: it checks
/// that the file exists and logs instead of producing sound.
pub struct SilentPlayer {
    library: SoundLibrary,
}

impl SilentPlayer {
    pub fn new(library: SoundLibrary) -> Self {
        Self { library }
    }
}

impl SoundPlayer for SilentPlayer {
    fn play(&mut self, sound: AmbientSound) -> Result<()> {
        let path = self.library.resolve(sound)?;
        info!(
            "Audio output disabled, not playing {} (build with --features audio)",
            path.display()
        );
        Ok(())
    }

    fn stop(&mut self) {
        debug!("Audio output disabled, nothing to stop");
    }
}

#[cfg(feature = "audio")]
pub use rodio_player::RodioPlayer;

#[cfg(feature = "audio")]
mod rodio_player {
    use std::fs::File;
    use std::io::BufReader;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::debug;

    use super::SoundLibrary;
    use crate::ambience::{AmbientSound, SoundPlayer};
    use crate::error::{OverlayError, Result};

    /// Loops one decoded file on the default output device
    pub struct RodioPlayer {
        library: SoundLibrary,
        volume: f32,
        output: Option<(OutputStream, OutputStreamHandle)>,
        sink: Option<Sink>,
    }

    impl RodioPlayer {
        pub fn new(library: SoundLibrary, volume: f32) -> Self {
            Self {
                library,
                volume,
                output: None,
                sink: None,
            }
        }

        fn handle(&mut self, sound: AmbientSound) -> Result<&OutputStreamHandle> {
            let output = match self.output.take() {
                Some(output) => output,
                None => OutputStream::try_default().map_err(|e| OverlayError::AudioInitError {
                    sound,
                    reason: e.to_string(),
                })?,
            };
            let (_, handle) = self.output.insert(output);
            Ok(handle)
        }
    }

    impl SoundPlayer for RodioPlayer {
        fn play(&mut self, sound: AmbientSound) -> Result<()> {
            let path = self.library.resolve(sound)?;
            let init_error = |reason: String| OverlayError::AudioInitError { sound, reason };

            let file = File::open(&path).map_err(|e| init_error(e.to_string()))?;
            let source = Decoder::new(BufReader::new(file)).map_err(|e| init_error(e.to_string()))?;

            let sink = Sink::try_new(self.handle(sound)?).map_err(|e| init_error(e.to_string()))?;
            sink.set_volume(self.volume);
            sink.append(source.repeat_infinite());
            sink.play();

            debug!("Looping {} at volume {}", path.display(), self.volume);
            self.sink = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }
    }
}

/// Build the player for this build: rodio with the `audio` feature, the
/// silent player otherwise.
#[cfg(feature = "audio")]
pub fn default_player(config: &AmbienceConfig) -> RodioPlayer {
    RodioPlayer::new(SoundLibrary::new(&config.sounds_dir), config.volume)
}

#[cfg(not(feature = "audio"))]
pub fn default_player(config: &AmbienceConfig) -> SilentPlayer {
    SilentPlayer::new(SoundLibrary::new(&config.sounds_dir))
}
