//! AmbientAudioMixer unit tests

#[cfg(test)]
mod tests {
    use panorama_tour::{
        audio::{AmbientAudioMixer, MemoryAudioBackend},
        types::AudioTrack,
    };

    fn make_mixer() -> (AmbientAudioMixer, MemoryAudioBackend) {
        let backend = MemoryAudioBackend::new();
        (AmbientAudioMixer::new(Box::new(backend.clone())), backend)
    }

    fn seaside() -> Vec<AudioTrack> {
        vec![
            AudioTrack::new("waves", "waves.ogg", 0.4),
            AudioTrack::new("gulls", "gulls.ogg", 0.2),
        ]
    }

    // -----------------------------------------------------------------------
    // Track set
    // -----------------------------------------------------------------------

    #[test]
    fn volume_change_touches_only_one_track() {
        let (mut mixer, backend) = make_mixer();
        mixer.set_tracks(&seaside());
        mixer.set_enabled(true);
        assert!(mixer.set_volume("waves", 0.8));

        assert_eq!(mixer.volume("waves"), Some(0.8));
        assert_eq!(mixer.volume("gulls"), Some(0.2));
        assert_eq!(backend.handle("waves").map(|h| h.volume), Some(0.8));
        assert_eq!(backend.handle("gulls").map(|h| h.volume), Some(0.2));

        mixer.set_tracks(&[]);
        assert_eq!(mixer.live_count(), 0);
        assert_eq!(backend.live_handles(), 0);
        assert!(backend.handle("waves").is_none());
    }

    #[test]
    fn replacing_tracks_releases_only_stale_handles() {
        let (mut mixer, backend) = make_mixer();
        mixer.set_tracks(&seaside());
        assert_eq!(backend.opened_total(), 2);

        mixer.set_tracks(&[
            AudioTrack::new("waves", "waves.ogg", 0.6),
            AudioTrack::new("wind", "wind.ogg", 0.3),
        ]);
        // waves kept its handle, gulls released, wind opened
        assert_eq!(backend.opened_total(), 3);
        assert_eq!(backend.live_handles(), 2);
        assert_eq!(mixer.track_ids(), vec!["waves", "wind"]);
        assert_eq!(mixer.volume("waves"), Some(0.6));
    }

    #[test]
    fn duplicate_ids_open_once() {
        let (mut mixer, backend) = make_mixer();
        mixer.set_tracks(&[
            AudioTrack::new("waves", "waves.ogg", 0.4),
            AudioTrack::new("waves", "other.ogg", 0.9),
        ]);
        assert_eq!(backend.opened_total(), 1);
        assert_eq!(mixer.volume("waves"), Some(0.4));
    }

    #[test]
    fn volumes_are_clamped() {
        let (mut mixer, _backend) = make_mixer();
        mixer.set_tracks(&seaside());
        mixer.set_volume("waves", 3.0);
        assert_eq!(mixer.volume("waves"), Some(1.0));
        mixer.set_volume("gulls", f32::NAN);
        assert_eq!(mixer.volume("gulls"), Some(0.0));
        assert!(!mixer.set_volume("foghorn", 0.5));
    }

    #[test]
    fn unavailable_track_is_skipped() {
        let (mut mixer, backend) = make_mixer();
        backend.mark_unavailable("gulls.ogg");
        mixer.set_tracks(&seaside());
        assert_eq!(mixer.track_ids(), vec!["waves"]);
    }

    // -----------------------------------------------------------------------
    // Enable / disable
    // -----------------------------------------------------------------------

    #[test]
    fn disable_pauses_without_releasing() {
        let (mut mixer, backend) = make_mixer();
        mixer.set_tracks(&seaside());
        assert!(!mixer.is_playing("waves"));

        mixer.set_enabled(true);
        assert!(mixer.is_playing("waves") && mixer.is_playing("gulls"));

        mixer.set_enabled(false);
        assert!(!mixer.is_playing("waves"));
        assert_eq!(backend.live_handles(), 2);

        mixer.set_enabled(true);
        assert_eq!(backend.opened_total(), 2);
        assert!(backend.handle("gulls").is_some_and(|h| h.playing && h.looping));
    }

    #[test]
    fn tracks_added_while_enabled_start_immediately() {
        let (mut mixer, backend) = make_mixer();
        mixer.set_enabled(true);
        mixer.set_tracks(&seaside());
        assert!(backend.handle("waves").is_some_and(|h| h.playing));
    }

    // -----------------------------------------------------------------------
    // Autoplay policy
    // -----------------------------------------------------------------------

    #[test]
    fn blocked_autoplay_stays_enabled_and_resumes_on_gesture() {
        let (mut mixer, backend) = make_mixer();
        backend.set_autoplay_blocked(true);
        mixer.set_tracks(&seaside());
        mixer.set_enabled(true);

        assert!(mixer.is_enabled());
        assert!(mixer.is_blocked("waves"));
        assert!(!mixer.is_playing("waves"));

        // Still blocked: nothing resumes
        assert_eq!(mixer.notify_user_gesture(), 0);

        backend.set_autoplay_blocked(false);
        assert_eq!(mixer.notify_user_gesture(), 2);
        assert!(mixer.is_playing("waves") && !mixer.is_blocked("waves"));
        assert_eq!(mixer.notify_user_gesture(), 0);
    }

    #[test]
    fn gesture_does_nothing_while_disabled() {
        let (mut mixer, _backend) = make_mixer();
        mixer.set_tracks(&seaside());
        assert_eq!(mixer.notify_user_gesture(), 0);
        assert!(!mixer.is_playing("waves"));
    }

    #[test]
    fn dropping_the_mixer_releases_handles() {
        let (mut mixer, backend) = make_mixer();
        mixer.set_tracks(&seaside());
        drop(mixer);
        assert_eq!(backend.live_handles(), 0);
    }
}
